//! Reference table and range enricher.
//!
//! A result that arrives without a reference range gets one attached from an
//! immutable code-keyed table, built once per session. Enrichment never
//! touches a result that already carries a range.

use std::collections::HashMap;

use crate::models::{ClinicalResult, ReferenceRange};

/// One row of the reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeEntry {
    pub low: f64,
    pub high: f64,
    pub unit: String,
}

impl RangeEntry {
    fn new(low: f64, high: f64, unit: &str) -> Self {
        Self {
            low,
            high,
            unit: unit.to_string(),
        }
    }
}

/// Immutable LOINC-code → range lookup.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    entries: HashMap<String, RangeEntry>,
}

impl ReferenceTable {
    /// Table seeded with common chemistry, hematology and vital sign codes.
    pub fn builtin() -> Self {
        let rows: &[(&str, f64, f64, &str)] = &[
            // Basic metabolic panel
            ("2345-7", 70.0, 100.0, "mg/dL"),  // Glucose
            ("2951-2", 136.0, 145.0, "mmol/L"), // Sodium
            ("2823-3", 3.5, 5.1, "mmol/L"),     // Potassium
            ("2075-0", 98.0, 107.0, "mmol/L"),  // Chloride
            ("3094-0", 7.0, 20.0, "mg/dL"),     // Urea nitrogen
            ("2160-0", 0.6, 1.2, "mg/dL"),      // Creatinine
            ("17861-6", 8.5, 10.2, "mg/dL"),    // Calcium
            // Hematology
            ("718-7", 12.0, 17.5, "g/dL"),      // Hemoglobin
            ("6690-2", 4.5, 11.0, "10*3/uL"),   // Leukocytes
            ("777-3", 150.0, 400.0, "10*3/uL"), // Platelets
            // Vital signs
            ("8867-4", 60.0, 100.0, "/min"),  // Heart rate
            ("9279-1", 12.0, 20.0, "/min"),   // Respiratory rate
            ("8480-6", 90.0, 120.0, "mmHg"),  // Systolic BP
            ("8462-4", 60.0, 80.0, "mmHg"),   // Diastolic BP
            ("8310-5", 36.1, 37.2, "Cel"),    // Body temperature
            ("59408-5", 95.0, 100.0, "%"),    // Oxygen saturation
        ];
        Self {
            entries: rows
                .iter()
                .map(|(code, low, high, unit)| {
                    (code.to_string(), RangeEntry::new(*low, *high, unit))
                })
                .collect(),
        }
    }

    /// Build a table from caller-supplied rows (facility-specific ranges).
    pub fn from_entries(entries: impl IntoIterator<Item = (String, RangeEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn lookup(&self, code: &str) -> Option<&RangeEntry> {
        self.entries.get(code)
    }

    /// Attach a reference range when one is known for the result's code.
    ///
    /// Idempotent: a result that already carries a range, has no code, or has
    /// a code outside the table comes back unchanged.
    pub fn enrich(&self, result: ClinicalResult) -> ClinicalResult {
        if result.reference_range.is_some() {
            return result;
        }
        let Some(entry) = result.code.as_deref().and_then(|c| self.lookup(c)) else {
            return result;
        };
        let mut result = result;
        result.reference_range = Some(ReferenceRange {
            low: Some(entry.low),
            high: Some(entry.high),
            unit: Some(entry.unit.clone()),
            text: Some(format!("{} — {} {}", entry.low, entry.high, entry.unit)),
        });
        result
    }
}
