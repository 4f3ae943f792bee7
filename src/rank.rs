//! Snapshot ordering for presentation.
//!
//! Both policies use the standard library's stable sort, so records with
//! equal keys keep the order the scheduler returned them in.

use std::cmp::{Ordering, Reverse};

use crate::config::RankingPolicy;
use crate::scheduler::model::TaskRecord;

/// Orders `records` in place according to `policy`.
pub fn rank(records: &mut [TaskRecord], policy: RankingPolicy) {
    records.sort_by(|a, b| compare(a, b, policy));
}

/// Comparator behind [`rank`].
pub fn compare(a: &TaskRecord, b: &TaskRecord, policy: RankingPolicy) -> Ordering {
    match policy {
        RankingPolicy::RuntimeDescending => by_runtime(a, b),
        RankingPolicy::CoreThenRuntime => a
            .core_affinity
            .group_key()
            .cmp(&b.core_affinity.group_key())
            .then_with(|| by_runtime(a, b)),
    }
}

fn by_runtime(a: &TaskRecord, b: &TaskRecord) -> Ordering {
    Reverse(a.runtime_counter).cmp(&Reverse(b.runtime_counter))
}
