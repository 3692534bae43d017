//! Bulk loader.
//!
//! Issues the three category queries concurrently and isolates failure per
//! category: one failed fetch never blocks the other buckets. The loader is
//! pure with respect to session state; it returns the per-category outcomes
//! and the session commits them under its own lock, so a patient switch
//! mid-flight can simply discard the whole batch.

use crate::models::{ClinicalResult, ResultCategory};

use super::error::FetchError;
use super::reference::ReferenceTable;
use super::traits::ResultsClient;

/// Outcome of one category fetch, already enriched on success.
#[derive(Debug)]
pub struct CategoryLoad {
    pub category: ResultCategory,
    pub outcome: Result<Vec<ClinicalResult>, FetchError>,
}

/// Summary of a bulk load, returned to the caller of `open`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkLoadReport {
    pub loaded: Vec<ResultCategory>,
    pub failed: Vec<(ResultCategory, String)>,
}

impl BulkLoadReport {
    pub fn fully_loaded(&self) -> bool {
        self.failed.is_empty() && !self.loaded.is_empty()
    }
}

/// Fetch all three categories concurrently and enrich every record.
pub async fn fetch_all(
    client: &dyn ResultsClient,
    table: &ReferenceTable,
    patient_id: &str,
) -> Vec<CategoryLoad> {
    let (labs, vitals, reports) = tokio::join!(
        client.fetch(patient_id, ResultCategory::Laboratory),
        client.fetch(patient_id, ResultCategory::VitalSign),
        client.fetch(patient_id, ResultCategory::DiagnosticReport),
    );
    [
        (ResultCategory::Laboratory, labs),
        (ResultCategory::VitalSign, vitals),
        (ResultCategory::DiagnosticReport, reports),
    ]
    .into_iter()
    .map(|(category, outcome)| enriched(table, category, outcome))
    .collect()
}

/// Re-fetch a single category (the retry affordance after a partial failure).
pub async fn fetch_one(
    client: &dyn ResultsClient,
    table: &ReferenceTable,
    patient_id: &str,
    category: ResultCategory,
) -> CategoryLoad {
    let outcome = client.fetch(patient_id, category).await;
    enriched(table, category, outcome)
}

fn enriched(
    table: &ReferenceTable,
    category: ResultCategory,
    outcome: Result<Vec<ClinicalResult>, FetchError>,
) -> CategoryLoad {
    CategoryLoad {
        category,
        outcome: outcome.map(|results| results.into_iter().map(|r| table.enrich(r)).collect()),
    }
}
