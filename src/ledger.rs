//! Shared violation ledger.
//!
//! One instance per exam session, created with all counts zero and shared
//! behind an `Arc`. The only mutation is a single-field atomic increment,
//! so counts are monotonically non-decreasing for the session's lifetime.
//! Consumers (UI summary, submission logic) read snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::ViolationKind;

/// Per-kind violation counters.
#[derive(Debug, Default)]
pub struct ViolationLedger {
    counts: [AtomicU64; ViolationKind::ALL.len()],
}

impl ViolationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `kind` by one. Never fails, never blocks.
    pub fn increment(&self, kind: ViolationKind) {
        // Plain counter, no cross-field ordering required.
        self.counts[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, kind: ViolationKind) -> u64 {
        self.counts[kind.index()].load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        ViolationKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            face_not_visible: self.count(ViolationKind::FaceNotVisible),
            multiple_faces: self.count(ViolationKind::MultipleFaces),
            mobile_detected: self.count(ViolationKind::MobileDetected),
            prohibited_object: self.count(ViolationKind::ProhibitedObject),
        }
    }
}

/// Read-only copy of the ledger for summaries.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub face_not_visible: u64,
    pub multiple_faces: u64,
    pub mobile_detected: u64,
    pub prohibited_object: u64,
}

impl LedgerSnapshot {
    pub fn total(&self) -> u64 {
        self.face_not_visible + self.multiple_faces + self.mobile_detected + self.prohibited_object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ledger_starts_at_zero() {
        let ledger = ViolationLedger::new();
        for kind in ViolationKind::ALL {
            assert_eq!(ledger.count(kind), 0);
        }
        assert_eq!(ledger.total(), 0);
    }

    #[test]
    fn n_increments_yield_count_n() {
        let ledger = ViolationLedger::new();
        for _ in 0..7 {
            ledger.increment(ViolationKind::MobileDetected);
        }
        assert_eq!(ledger.count(ViolationKind::MobileDetected), 7);
        assert_eq!(ledger.count(ViolationKind::FaceNotVisible), 0);
        assert_eq!(ledger.total(), 7);
    }

    #[test]
    fn counts_are_monotonically_non_decreasing() {
        let ledger = ViolationLedger::new();
        let mut last = 0;
        for _ in 0..20 {
            ledger.increment(ViolationKind::FaceNotVisible);
            let current = ledger.count(ViolationKind::FaceNotVisible);
            assert!(current > last);
            last = current;
        }
    }

    #[test]
    fn snapshot_reflects_per_kind_counts() {
        let ledger = ViolationLedger::new();
        ledger.increment(ViolationKind::FaceNotVisible);
        ledger.increment(ViolationKind::FaceNotVisible);
        ledger.increment(ViolationKind::ProhibitedObject);

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.face_not_visible, 2);
        assert_eq!(snapshot.multiple_faces, 0);
        assert_eq!(snapshot.mobile_detected, 0);
        assert_eq!(snapshot.prohibited_object, 1);
        assert_eq!(snapshot.total(), 3);
    }

    #[test]
    fn increments_from_many_threads_all_land() {
        use std::sync::Arc;

        let ledger = Arc::new(ViolationLedger::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let ledger = ledger.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..250 {
                    ledger.increment(ViolationKind::MultipleFaces);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.count(ViolationKind::MultipleFaces), 1000);
    }
}
