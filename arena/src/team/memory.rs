//! In-process team directory.

use super::{TeamDirectory, models::Team};
use crate::db::StoreResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Team directory kept in memory, filled by the host
#[derive(Default)]
pub struct InMemoryTeamDirectory {
    teams: RwLock<HashMap<String, Team>>,
}

impl InMemoryTeamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a team
    pub async fn upsert_team(&self, team: Team) {
        self.teams.write().await.insert(team.id.clone(), team);
    }

    /// Remove a team, returning whether it existed
    pub async fn remove_team(&self, team_id: &str) -> bool {
        self.teams.write().await.remove(team_id).is_some()
    }
}

#[async_trait]
impl TeamDirectory for InMemoryTeamDirectory {
    async fn get_team(&self, team_id: &str) -> StoreResult<Option<Team>> {
        Ok(self.teams.read().await.get(team_id).cloned())
    }
}
