//! PostgreSQL team directory.

use super::{TeamDirectory, models::Team};
use crate::db::{StoreResult, timeouts::with_default_timeout};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

/// Reads teams and rosters maintained by the host's team service
pub struct PgTeamDirectory {
    pool: PgPool,
}

impl PgTeamDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamDirectory for PgTeamDirectory {
    async fn get_team(&self, team_id: &str) -> StoreResult<Option<Team>> {
        let Some(row) = with_default_timeout(
            sqlx::query("SELECT id, name, captain_id FROM teams WHERE id = $1")
                .bind(team_id)
                .fetch_optional(&self.pool),
        )
        .await?
        else {
            return Ok(None);
        };

        let members = with_default_timeout(
            sqlx::query("SELECT user_id FROM team_members WHERE team_id = $1 ORDER BY joined_at")
                .bind(team_id)
                .fetch_all(&self.pool),
        )
        .await?
        .into_iter()
        .map(|r| r.try_get("user_id"))
        .collect::<Result<Vec<String>, _>>()?;

        Ok(Some(Team {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            captain_id: row.try_get("captain_id")?,
            members,
        }))
    }
}
