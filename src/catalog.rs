// src/catalog.rs
//! Promotion catalog collaborator interface
//!
//! The engine trusts the catalog to return active, branch-eligible,
//! in-window promotions ordered by descending priority and does not
//! re-sort. Lookup failures fail open: the engine applies no promotions.

use thiserror::Error;

use crate::Promotion;

#[derive(Error, Debug)]
#[error("catalog lookup failed: {0}")]
pub struct CatalogError(pub String);

/// Source of candidate promotions for a branch at a point in time.
pub trait PromotionCatalog {
    /// Active promotions for `branch_id` at `now_iso` (ISO-8601),
    /// filtered and ordered by descending priority.
    fn active(&self, branch_id: &str, now_iso: &str) -> Result<Vec<Promotion>, CatalogError>;
}

/// In-memory catalog for tests, benchmarks and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    promotions: Vec<Promotion>,
}

impl StaticCatalog {
    pub fn new(promotions: Vec<Promotion>) -> Self {
        Self { promotions }
    }
}

impl PromotionCatalog for StaticCatalog {
    fn active(&self, branch_id: &str, now_iso: &str) -> Result<Vec<Promotion>, CatalogError> {
        let mut candidates: Vec<Promotion> = self
            .promotions
            .iter()
            .filter(|p| {
                p.active
                    && (p.applies_to_branch_ids.is_empty()
                        || p.applies_to_branch_ids.iter().any(|b| b == branch_id))
                    // ISO-8601 timestamps in a uniform format compare
                    // correctly as strings.
                    && p.valid_from.as_deref().map_or(true, |from| from <= now_iso)
                    && p.valid_to.as_deref().map_or(true, |to| now_iso <= to)
            })
            .cloned()
            .collect();

        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(candidates)
    }
}
