//! Reconciliation: diffing observed task completions against the ledger
//! and crediting points for tasks seen for the first time.

use crate::ledger::UserLedger;
use crate::tasks::CompletedTask;
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    /// How many completed tasks the source reported.
    pub total_completed_tasks: usize,

    /// How many of them had never been credited before.
    pub newly_counted_tasks: usize,

    /// Points credited by this pass.
    pub points_gained_this_sync: u64,
}

impl SyncStats {
    /// Whether this pass mutated the ledger (and so needs persisting).
    pub fn changed(&self) -> bool {
        self.points_gained_this_sync > 0
    }
}

/// Credit points for completed tasks that have not been counted yet.
///
/// Membership checks go through the ledger's dedup set, so re-running
/// with the same snapshot is a no-op: each external task id is credited
/// at most once for the lifetime of the ledger. Duplicate ids within a
/// single snapshot count once. The ledger is only mutated when there is
/// something to credit.
pub fn reconcile(
    ledger: &mut UserLedger,
    completed: &[CompletedTask],
    points_per_task: u64,
) -> SyncStats {
    let mut new_ids: HashSet<&str> = HashSet::new();
    for task in completed {
        if !ledger.counted_tasks.contains(&task.id) {
            new_ids.insert(task.id.as_str());
        }
    }

    let newly_counted = new_ids.len();
    let points_gained = newly_counted as u64 * points_per_task;

    if points_gained > 0 {
        ledger.points += points_gained;
        ledger.lifetime_points += points_gained;
        ledger
            .counted_tasks
            .extend(new_ids.into_iter().map(String::from));
    }

    SyncStats {
        total_completed_tasks: completed.len(),
        newly_counted_tasks: newly_counted,
        points_gained_this_sync: points_gained,
    }
}
