//! The central-side registry of [`NodeState`]s consumed by the Decoder &
//! Alias Cache (C6), per §4.6.
//!
//! Bounded by a TTL since last touch (default 24h) to prevent unbounded
//! growth when nodes churn — this mirrors the teacher's `SingletonManager`
//! pattern of a shared, lock-guarded registry keyed by an id, generalized
//! here to (`group_id`, `node_id`) and to time-based eviction rather than
//! reference counting.

use std::{collections::HashMap, time::Duration};

use oee_domain::NodeState;

/// Default time since last touch after which a node's cached state is
/// evicted, per §4.6.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    state: NodeState,
    last_touched_ms: i64,
}

/// A TTL-bounded map of Sparkplug [`NodeState`]s keyed by (`group_id`,
/// `node_id`).
pub struct AliasCache {
    ttl_ms: i64,
    nodes: HashMap<(String, String), Entry>,
}

impl AliasCache {
    /// Creates an empty cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_ms: ttl.as_millis() as i64,
            nodes: HashMap::new(),
        }
    }

    /// Returns a mutable reference to the node state for (`group_id`,
    /// `node_id`), creating an offline entry if absent, and refreshes its
    /// touch time.
    pub fn get_or_insert(&mut self, group_id: &str, node_id: &str, now_ms: i64) -> &mut NodeState {
        let key = (group_id.to_string(), node_id.to_string());
        let entry = self.nodes.entry(key).or_insert_with(|| Entry {
            state: NodeState::new(group_id, node_id),
            last_touched_ms: now_ms,
        });
        entry.last_touched_ms = now_ms;
        &mut entry.state
    }

    /// Evicts every node not touched within the TTL window. Returns the
    /// number of nodes evicted.
    pub fn evict_expired(&mut self, now_ms: i64) -> usize {
        let cutoff = now_ms - self.ttl_ms;
        let before = self.nodes.len();
        self.nodes.retain(|_, entry| entry.last_touched_ms >= cutoff);
        before - self.nodes.len()
    }

    /// Number of nodes currently tracked.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the cache currently tracks no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_insert_creates_offline_state_on_first_touch() {
        let mut cache = AliasCache::new(DEFAULT_TTL);
        let node = cache.get_or_insert("Plant1", "Line1", 0);
        assert_eq!(node.group_id, "Plant1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn touching_an_existing_node_refreshes_its_ttl() {
        let mut cache = AliasCache::new(Duration::from_millis(1_000));
        let _ = cache.get_or_insert("Plant1", "Line1", 0);
        let _ = cache.get_or_insert("Plant1", "Line1", 900);
        assert_eq!(cache.evict_expired(1_500), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evict_expired_drops_stale_nodes_only() {
        let mut cache = AliasCache::new(Duration::from_millis(1_000));
        let _ = cache.get_or_insert("Plant1", "Line1", 0);
        let _ = cache.get_or_insert("Plant1", "Line2", 5_000);
        assert_eq!(cache.evict_expired(5_100), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_or_insert("Plant1", "Line2", 5_100).group_id == "Plant1");
    }
}
