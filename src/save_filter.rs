//! Decides which segments a save pushes to the platform.
//!
//! The planner is a pure function of the item and the settings: identical
//! inputs always produce the identical action list. Segments excluded by the
//! status filter are simply left out of the push; their in-scene state is
//! not reverted (reverting requires an explicit item reload).

use crate::config::Settings;
use crate::gateway::SegmentAction;
use crate::state_machine::{Item, SegmentStatus};

/// Build the list of segment actions for one save.
///
/// Policy, in order:
/// 1. A segment marked deleted becomes a `Delete`, unconditionally.
/// 2. With `ignore_segment_status_on_save`, every remaining segment becomes
///    an `Upsert`.
/// 3. Otherwise only segments the viewer marks `Completed` or `InProgress`
///    are upserted; the rest are excluded from the push.
///
/// The upsert label falls back to the segment name when no explicit label
/// mapping was assigned.
pub fn plan(item: &Item, settings: &Settings) -> Vec<SegmentAction> {
    item.segments
        .iter()
        .filter_map(|segment| {
            if segment.deleted {
                return Some(SegmentAction::Delete {
                    segment_id: segment.id,
                });
            }
            let included = settings.ignore_segment_status_on_save
                || matches!(
                    segment.status,
                    SegmentStatus::Completed | SegmentStatus::InProgress
                );
            included.then(|| SegmentAction::Upsert {
                segment_id: segment.id,
                label: segment
                    .label
                    .clone()
                    .unwrap_or_else(|| segment.name.clone()),
                geometry: segment.geometry.clone(),
            })
        })
        .collect()
}
