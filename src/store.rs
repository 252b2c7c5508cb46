//! ==============================================================================
//! store.rs - node state store
//! ==============================================================================
//!
//! purpose:
//!     holds the authoritative map of node id -> latest [`NodeRecord`] and
//!     arbitrates concurrent access. this is the only shared mutable state in
//!     the hub; the http handlers are thin wrappers around it.
//!
//! concurrency model:
//!     one tokio RwLock around a BTreeMap. `upsert` holds the write lock for
//!     the whole read-modify-write, so concurrent events for the same node
//!     are serialized and counter increments are never lost. readers take the
//!     read lock and clone out (snapshot semantics, never a live reference).
//!
//! relationships:
//!     - used by: server.rs (ingestion and query handlers)
//!     - uses: domain.rs (NodeRecord, MotionEvent)
//!
//! ==============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{MotionEvent, NodeRecord};

/// cheap-to-clone handle to the shared node map
///
/// constructed once at startup and passed into every handler; there are no
/// module-level globals.
#[derive(Clone, Default)]
pub struct NodeStore {
    inner: Arc<RwLock<BTreeMap<String, NodeRecord>>>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// apply one accepted event to its node, creating the record if absent
    ///
    /// aggregation rule, per counter:
    ///   - if the event carries any counter > 0 it is an authoritative total:
    ///     each counter > 0 overwrites the stored one, a 0 leaves it alone.
    ///   - if both counters are 0 the device reported a bare state change:
    ///     bump pir_hits when the state starts with "motion", bump vib_hits
    ///     when it starts with "vibration" (case-insensitive, not exclusive).
    /// state and time are always overwritten; last_update is always stamped
    /// with the server clock, never the device-reported time.
    pub async fn upsert(&self, event: &MotionEvent) {
        let now = epoch_seconds();
        let mut nodes = self.inner.write().await;
        let rec = nodes.entry(event.node.clone()).or_default();

        if event.pir_hits > 0 || event.vib_hits > 0 {
            if event.pir_hits > 0 {
                rec.pir_hits = event.pir_hits;
            }
            if event.vib_hits > 0 {
                rec.vib_hits = event.vib_hits;
            }
        } else {
            if state_has_prefix(&event.state, "motion") {
                rec.pir_hits += 1;
            }
            if state_has_prefix(&event.state, "vibration") {
                rec.vib_hits += 1;
            }
        }

        rec.state = event.state.clone();
        rec.time = event.time.clone();
        rec.last_update = now;

        debug!(
            node = %event.node,
            state = %rec.state,
            pir_hits = rec.pir_hits,
            vib_hits = rec.vib_hits,
            "node updated"
        );
    }

    /// snapshot of one node's record, None if it has never reported
    pub async fn get(&self, node: &str) -> Option<NodeRecord> {
        self.inner.read().await.get(node).cloned()
    }

    /// all known node ids, ascending lexicographic (BTreeMap iteration order)
    pub async fn node_ids(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    /// lexicographically smallest node id, the default selection for queries
    pub async fn first_node_id(&self) -> Option<String> {
        self.inner.read().await.keys().next().cloned()
    }
}

/// case-insensitive prefix test used to classify bare state transitions
///
/// only "motion" and "vibration" are ever passed here; keep it that way
/// unless the firmware grows a third sensor type.
fn state_has_prefix(state: &str, prefix: &str) -> bool {
    state
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(node: &str, state: &str, pir: u64, vib: u64) -> MotionEvent {
        MotionEvent {
            node: node.to_string(),
            state: state.to_string(),
            time: "10:00:00".to_string(),
            pir_hits: pir,
            vib_hits: vib,
        }
    }

    #[test]
    fn prefix_test_is_case_insensitive() {
        assert!(state_has_prefix("Motion detected", "motion"));
        assert!(state_has_prefix("MOTION", "motion"));
        assert!(state_has_prefix("motionless", "motion"));
        assert!(state_has_prefix("Vibration!", "vibration"));
        assert!(!state_has_prefix("Idle", "motion"));
        assert!(!state_has_prefix("vib", "vibration"));
        assert!(!state_has_prefix("", "motion"));
        // multi-byte char straddling the prefix boundary must not panic
        assert!(!state_has_prefix("mötion", "motion"));
    }

    #[tokio::test]
    async fn motion_state_increments_pir_only() {
        let store = NodeStore::new();
        store.upsert(&event("Room-1", "Motion", 0, 0)).await;

        let rec = store.get("Room-1").await.unwrap();
        assert_eq!(rec.pir_hits, 1);
        assert_eq!(rec.vib_hits, 0);
        assert_eq!(rec.state, "Motion");
        assert_eq!(rec.time, "10:00:00");
        assert!(rec.last_update > 0);
    }

    #[tokio::test]
    async fn vibration_state_increments_vib_only() {
        let store = NodeStore::new();
        store.upsert(&event("Room-1", "vibration burst", 0, 0)).await;

        let rec = store.get("Room-1").await.unwrap();
        assert_eq!(rec.pir_hits, 0);
        assert_eq!(rec.vib_hits, 1);
    }

    #[tokio::test]
    async fn unclassified_state_increments_nothing() {
        let store = NodeStore::new();
        store.upsert(&event("Room-1", "Idle", 0, 0)).await;

        let rec = store.get("Room-1").await.unwrap();
        assert_eq!(rec.pir_hits, 0);
        assert_eq!(rec.vib_hits, 0);
        assert_eq!(rec.state, "Idle");
    }

    #[tokio::test]
    async fn explicit_totals_overwrite_regardless_of_prior_value() {
        let store = NodeStore::new();
        for _ in 0..3 {
            store.upsert(&event("Room-1", "Motion", 0, 0)).await;
        }
        store.upsert(&event("Room-1", "Motion", 5, 0)).await;

        let rec = store.get("Room-1").await.unwrap();
        assert_eq!(rec.pir_hits, 5);
    }

    #[tokio::test]
    async fn zero_counter_alongside_explicit_total_is_left_alone() {
        let store = NodeStore::new();
        store.upsert(&event("Room-1", "Motion", 8, 0)).await;
        // vib total arrives, pir total omitted (0): pir must survive
        store.upsert(&event("Room-1", "Vibration", 0, 3)).await;

        let rec = store.get("Room-1").await.unwrap();
        assert_eq!(rec.pir_hits, 8);
        assert_eq!(rec.vib_hits, 3);
    }

    #[tokio::test]
    async fn explicit_total_event_does_not_also_increment() {
        let store = NodeStore::new();
        // state says "Motion" but the event carries a vib total, so the
        // overwrite branch fires and pir is untouched
        store.upsert(&event("Room-1", "Motion", 0, 4)).await;

        let rec = store.get("Room-1").await.unwrap();
        assert_eq!(rec.pir_hits, 0);
        assert_eq!(rec.vib_hits, 4);
        assert_eq!(rec.state, "Motion");
    }

    #[tokio::test]
    async fn node_ids_sorted_without_duplicates() {
        let store = NodeStore::new();
        for node in ["Garage", "Attic", "Room-1", "Attic"] {
            store.upsert(&event(node, "Motion", 0, 0)).await;
        }

        assert_eq!(store.node_ids().await, vec!["Attic", "Garage", "Room-1"]);
        assert_eq!(store.first_node_id().await.as_deref(), Some("Attic"));
    }

    #[tokio::test]
    async fn empty_store_queries() {
        let store = NodeStore::new();
        assert!(store.get("Room-1").await.is_none());
        assert!(store.node_ids().await.is_empty());
        assert!(store.first_node_id().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_increments_are_never_lost() {
        let store = NodeStore::new();
        let n = 100;

        let mut tasks = Vec::new();
        for _ in 0..n {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.upsert(&event("Room-1", "Motion", 0, 0)).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let rec = store.get("Room-1").await.unwrap();
        assert_eq!(rec.pir_hits, n);
        assert_eq!(rec.vib_hits, 0);
    }

    #[tokio::test]
    async fn snapshot_reads_do_not_track_later_writes() {
        let store = NodeStore::new();
        store.upsert(&event("Room-1", "Motion", 0, 0)).await;
        let before = store.get("Room-1").await.unwrap();

        store.upsert(&event("Room-1", "Motion", 0, 0)).await;
        assert_eq!(before.pir_hits, 1);
        assert_eq!(store.get("Room-1").await.unwrap().pir_hits, 2);
    }
}
