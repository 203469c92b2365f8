//! Explicit session context: who is working, in which team, in which role.
//! Created at session start and owned by the orchestrator for its lifetime.

use serde::{Deserialize, Serialize};

use crate::state_machine::{Role, TeamId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: UserId,
    pub team_id: TeamId,
    pub role: Role,
}

impl SessionContext {
    pub fn new(user_id: UserId, team_id: TeamId, role: Role) -> Self {
        Self {
            user_id,
            team_id,
            role,
        }
    }
}
