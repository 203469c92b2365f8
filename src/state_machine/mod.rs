//! Status model and job lifecycle for labeling work.

pub mod item;
pub mod job;
pub mod machine;

pub use item::{
    Item, ItemId, ItemStatus, JobId, Role, Segment, SegmentId, SegmentStatus, Tag, TeamId, UserId,
    can_transition,
};
pub use job::{ItemRef, Job, JobStatus};
pub use machine::JobStateMachine;
