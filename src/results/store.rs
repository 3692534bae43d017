//! Consolidated result store.
//!
//! Three id-keyed buckets, one per category. Two merge rules resolve the
//! bulk-load-vs-push race:
//! - `seed` only fills ids not already present (a pushed record is never
//!   clobbered by an older bulk snapshot)
//! - `upsert` keeps an existing reference range when the incoming record
//!   lacks one (enrichment is never regressed)

use std::collections::HashMap;

use crate::models::{ClinicalResult, ResultCategory};

/// Per-bucket load progress, drives the view's retry affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded,
    Failed,
}

#[derive(Debug, Default)]
struct Bucket {
    by_id: HashMap<String, ClinicalResult>,
    state: LoadState,
}

#[derive(Debug)]
pub struct ResultStore {
    buckets: HashMap<ResultCategory, Bucket>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            buckets: ResultCategory::ALL
                .into_iter()
                .map(|c| (c, Bucket::default()))
                .collect(),
        }
    }

    fn bucket_mut(&mut self, category: ResultCategory) -> &mut Bucket {
        self.buckets.entry(category).or_default()
    }

    /// Seed a bucket from a bulk snapshot and mark it Loaded.
    ///
    /// Ids already present are skipped. Returns how many records were
    /// actually inserted.
    pub fn seed(&mut self, category: ResultCategory, results: Vec<ClinicalResult>) -> usize {
        let bucket = self.bucket_mut(category);
        let mut inserted = 0;
        for result in results {
            bucket.by_id.entry(result.id.clone()).or_insert_with(|| {
                inserted += 1;
                result
            });
        }
        bucket.state = LoadState::Loaded;
        inserted
    }

    /// Insert or replace one record, keeping prior enrichment.
    ///
    /// Returns a clone of the stored record after the merge, which is what
    /// classification must run on.
    pub fn upsert(&mut self, mut result: ClinicalResult) -> ClinicalResult {
        let bucket = self.bucket_mut(result.category);
        if result.reference_range.is_none() {
            if let Some(existing) = bucket.by_id.get(&result.id) {
                result.reference_range = existing.reference_range.clone();
            }
        }
        bucket.by_id.insert(result.id.clone(), result.clone());
        result
    }

    pub fn contains(&self, category: ResultCategory, id: &str) -> bool {
        self.buckets
            .get(&category)
            .is_some_and(|b| b.by_id.contains_key(id))
    }

    /// Snapshot of one bucket, newest effective time first.
    pub fn get(&self, category: ResultCategory) -> Vec<ClinicalResult> {
        let mut results: Vec<ClinicalResult> = self
            .buckets
            .get(&category)
            .map(|b| b.by_id.values().cloned().collect())
            .unwrap_or_default();
        results.sort_by(|a, b| {
            b.effective_time
                .cmp(&a.effective_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        results
    }

    pub fn mark_failed(&mut self, category: ResultCategory) {
        self.bucket_mut(category).state = LoadState::Failed;
    }

    pub fn load_state(&self, category: ResultCategory) -> LoadState {
        self.buckets
            .get(&category)
            .map(|b| b.state)
            .unwrap_or_default()
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}
