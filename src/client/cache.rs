//! Cached query results with explicit invalidation.

use dashmap::DashMap;
use serde_json::Value;

/// Key of the cached wallet balance query
pub const WALLET_BALANCE_QUERY: &str = "wallet-balance";

#[derive(Debug, Default)]
struct Entry {
    value: Option<Value>,
    generation: u64,
}

/// Query cache keyed by name.
///
/// Each key carries a generation counter bumped on every invalidation, so
/// callers can tell how many times a query was marked stale.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: DashMap<String, Entry>,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).and_then(|e| e.value.clone())
    }

    pub fn set(&self, key: &str, value: Value) {
        self.entries.entry(key.to_string()).or_default().value = Some(value);
    }

    /// Drop the cached value and bump the key's generation
    pub fn invalidate(&self, key: &str) {
        let mut entry = self.entries.entry(key.to_string()).or_default();
        entry.value = None;
        entry.generation += 1;
    }

    #[must_use]
    pub fn generation(&self, key: &str) -> u64 {
        self.entries.get(key).map(|e| e.generation).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalidate_clears_value_and_counts() {
        let cache = QueryCache::new();
        assert_eq!(cache.generation(WALLET_BALANCE_QUERY), 0);

        cache.set(WALLET_BALANCE_QUERY, json!({"balance_minor": 500}));
        assert!(cache.get(WALLET_BALANCE_QUERY).is_some());

        cache.invalidate(WALLET_BALANCE_QUERY);
        assert!(cache.get(WALLET_BALANCE_QUERY).is_none());
        assert_eq!(cache.generation(WALLET_BALANCE_QUERY), 1);

        cache.set(WALLET_BALANCE_QUERY, json!({"balance_minor": 900}));
        assert_eq!(cache.generation(WALLET_BALANCE_QUERY), 1);
    }
}
