// src/cache.rs
//! Bounded AST cache with least-frequently-used eviction
//!
//! Keys are a 32-bit FNV-1a hash of `"{promo_id}:{dsl}"`. The hash is fast
//! and non-cryptographic; collisions are tolerated as a performance
//! trade-off, not guarded against.

use crate::parser::ast::RuleSet;
use ahash::HashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_CACHE_CAPACITY: usize = 200;

/// Cache key for a `(promotion id, DSL text)` pair.
pub fn cache_key(promo_id: &str, dsl: &str) -> u32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut hash = FNV_OFFSET;
    for byte in promo_id
        .bytes()
        .chain(std::iter::once(b':'))
        .chain(dsl.bytes())
    {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

struct CacheEntry {
    ast: Arc<RuleSet>,
    created_at: Instant,
    hits: u64,
}

/// Bounded key -> AST cache. Eviction is synchronous inside [`AstCache::set`];
/// the entry with the fewest hits is removed, ties broken by map iteration
/// order (implementation-defined).
pub struct AstCache {
    entries: HashMap<u32, CacheEntry>,
    capacity: usize,
}

/// Aggregate cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub total_hits: u64,
}

/// Read-only view of one cache entry for operational dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntrySnapshot {
    pub key: u32,
    pub hits: u64,
    pub age_ms: u64,
}

impl AstCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::default(),
            capacity,
        }
    }

    /// Look up a compiled AST, counting a hit on success.
    pub fn get(&mut self, key: u32) -> Option<Arc<RuleSet>> {
        let entry = self.entries.get_mut(&key)?;
        entry.hits += 1;
        Some(Arc::clone(&entry.ast))
    }

    /// Insert a compiled AST, evicting the least-hit entry at capacity.
    pub fn set(&mut self, key: u32, ast: Arc<RuleSet>) {
        if self.capacity == 0 {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_least_hit();
        }

        self.entries.insert(
            key,
            CacheEntry {
                ast,
                created_at: Instant::now(),
                hits: 1,
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            total_hits: self.entries.values().map(|e| e.hits).sum(),
        }
    }

    /// Per-entry view for metrics; does not count hits.
    pub fn snapshot(&self) -> Vec<CacheEntrySnapshot> {
        self.entries
            .iter()
            .map(|(key, entry)| CacheEntrySnapshot {
                key: *key,
                hits: entry.hits,
                age_ms: entry.created_at.elapsed().as_millis() as u64,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: u32) -> bool {
        self.entries.contains_key(&key)
    }

    fn evict_least_hit(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.hits)
            .map(|(key, _)| *key);

        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}

impl Default for AstCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile;

    fn ast(n: u32) -> Arc<RuleSet> {
        Arc::new(
            compile(&format!("WHEN CART.total > {n} THEN CART.PERCENT 10")).unwrap(),
        )
    }

    #[test]
    fn test_get_counts_hits() {
        let mut cache = AstCache::new(10);
        cache.set(1, ast(1));

        assert!(cache.get(1).is_some());
        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_none());

        // 1 on insert + 2 lookup hits.
        assert_eq!(cache.stats(), CacheStats { size: 1, total_hits: 3 });
    }

    #[test]
    fn test_eviction_removes_a_least_hit_entry() {
        let mut cache = AstCache::new(3);
        cache.set(1, ast(1));
        cache.set(2, ast(2));
        cache.set(3, ast(3));

        // Make key 2 the clear frequency winner.
        for _ in 0..10 {
            cache.get(2);
        }

        cache.set(4, ast(4));

        assert_eq!(cache.stats().size, 3);
        assert!(cache.contains(2), "most-hit entry must survive eviction");
        assert!(cache.contains(4));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut cache = AstCache::new(2);
        cache.set(1, ast(1));
        cache.set(2, ast(2));
        cache.set(2, ast(3));

        assert_eq!(cache.stats().size, 2);
        assert!(cache.contains(1));
    }

    #[test]
    fn test_clear_and_snapshot() {
        let mut cache = AstCache::new(5);
        cache.set(7, ast(7));
        cache.get(7);

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].key, 7);
        assert_eq!(snapshot[0].hits, 2);

        cache.clear();
        assert_eq!(cache.stats(), CacheStats { size: 0, total_hits: 0 });
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = AstCache::new(0);
        cache.set(1, ast(1));
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_cache_key_is_stable_and_input_sensitive() {
        let a = cache_key("promo-1", "WHEN CART.total > 1 THEN CART.PERCENT 1");
        let b = cache_key("promo-1", "WHEN CART.total > 1 THEN CART.PERCENT 1");
        let c = cache_key("promo-2", "WHEN CART.total > 1 THEN CART.PERCENT 1");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
