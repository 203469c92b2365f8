use std::fmt;

use serde::{Deserialize, Serialize};

use super::item::{ItemId, ItemStatus, JobId, Role, TeamId, UserId};

/// Lifecycle status of a labeling job.
///
/// `Pending → InProgress → OnReview → {Accepted, Rejected}`;
/// `Rejected → InProgress` via restart, `Accepted → Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    OnReview,
    Accepted,
    Rejected,
    Completed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::InProgress => write!(f, "in_progress"),
            JobStatus::OnReview => write!(f, "on_review"),
            JobStatus::Accepted => write!(f, "accepted"),
            JobStatus::Rejected => write!(f, "rejected"),
            JobStatus::Completed => write!(f, "completed"),
        }
    }
}

impl JobStatus {
    /// Terminal states stop further local mutation.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Accepted | JobStatus::Completed)
    }

    /// Statuses under which a job appears in the given role's work list.
    pub fn workable_for(role: Role) -> &'static [JobStatus] {
        match role {
            Role::Annotator => &[JobStatus::Pending, JobStatus::InProgress],
            Role::Reviewer => &[JobStatus::OnReview],
        }
    }
}

/// Lightweight per-item view carried by the job: id, name and the last
/// known status. Full payloads live in the local cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: ItemId,
    pub name: String,
    pub status: ItemStatus,
}

/// A labeling job: a dataset subset assigned to one annotator and later one
/// reviewer. Item order is stable and equals presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub team_id: TeamId,
    pub name: String,
    pub status: JobStatus,
    pub assigned_annotator_id: UserId,
    pub assigned_reviewer_id: UserId,
    pub items: Vec<ItemRef>,
}

impl Job {
    pub fn item(&self, id: ItemId) -> Option<&ItemRef> {
        self.items.iter().find(|it| it.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut ItemRef> {
        self.items.iter_mut().find(|it| it.id == id)
    }

    /// Items open for editing in the current cycle.
    pub fn editable_items(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|it| matches!(it.status, ItemStatus::None | ItemStatus::InProgress))
            .map(|it| it.id)
            .collect()
    }

    /// Whether this job belongs on the given user's work list.
    pub fn workable_by(&self, user_id: UserId, role: Role) -> bool {
        let assigned = match role {
            Role::Annotator => self.assigned_annotator_id == user_id,
            Role::Reviewer => self.assigned_reviewer_id == user_id,
        };
        assigned && JobStatus::workable_for(role).contains(&self.status)
    }

    /// Progress counters: (done, accepted, rejected, total).
    pub fn progress(&self) -> (usize, usize, usize, usize) {
        let mut done = 0;
        let mut accepted = 0;
        let mut rejected = 0;
        for it in &self.items {
            match it.status {
                ItemStatus::Done => done += 1,
                ItemStatus::Accepted => accepted += 1,
                ItemStatus::Rejected => rejected += 1,
                _ => {}
            }
        }
        (done, accepted, rejected, self.items.len())
    }
}
