//! Team data models.

use serde::{Deserialize, Serialize};

/// A team and its current roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub captain_id: String,
    /// User ids on the roster, captain included
    pub members: Vec<String>,
}

impl Team {
    pub fn member_count(&self) -> u32 {
        u32::try_from(self.members.len()).unwrap_or(u32::MAX)
    }

    pub fn is_captain(&self, user_id: &str) -> bool {
        self.captain_id == user_id
    }
}
