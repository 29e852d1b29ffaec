//! Team collaborator used by team-mode events to resolve captains and rosters.
//!
//! Team registration only carries a team id. The captain and roster size are
//! looked up here, so a caller cannot name themselves captain of someone
//! else's team or understate its size.

pub mod manager;
pub mod memory;
pub mod models;

use crate::db::StoreResult;
use async_trait::async_trait;

pub use manager::PgTeamDirectory;
pub use memory::InMemoryTeamDirectory;
pub use models::Team;

/// Read-only view of the host's teams
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Find a team by id, `None` if it does not exist
    async fn get_team(&self, team_id: &str) -> StoreResult<Option<Team>>;
}
