//! Status classifier.
//!
//! An explicit source interpretation always wins. Without one, a numeric
//! value is banded against its reference range with a critical margin of
//! 20 % of the span beyond each bound. Anything unclassifiable is Normal:
//! absence of information is not abnormal.

use crate::config::CRITICAL_MARGIN_FACTOR;
use crate::models::{ClinicalResult, Interpretation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictLevel {
    Normal,
    Low,
    High,
    CriticalLow,
    CriticalHigh,
    Abnormal,
}

impl VerdictLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Low => "low",
            Self::High => "high",
            Self::CriticalLow => "critical_low",
            Self::CriticalHigh => "critical_high",
            Self::Abnormal => "abnormal",
        }
    }
}

/// Classification outcome for one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub level: VerdictLevel,
    pub critical: bool,
}

impl Verdict {
    const fn new(level: VerdictLevel, critical: bool) -> Self {
        Self { level, critical }
    }
}

/// Classify a result. Priority: explicit interpretation, then numeric value
/// against a complete range, then Normal.
pub fn classify(result: &ClinicalResult) -> Verdict {
    if let Some(flag) = result.interpretation {
        return from_interpretation(flag);
    }
    if let (Some(magnitude), Some(range)) = (result.magnitude(), result.reference_range.as_ref()) {
        if let (Some(low), Some(high)) = (range.low, range.high) {
            return from_range(magnitude, low, high);
        }
    }
    Verdict::new(VerdictLevel::Normal, false)
}

fn from_interpretation(flag: Interpretation) -> Verdict {
    match flag {
        Interpretation::Normal => Verdict::new(VerdictLevel::Normal, false),
        Interpretation::High => Verdict::new(VerdictLevel::High, false),
        Interpretation::Low => Verdict::new(VerdictLevel::Low, false),
        Interpretation::CriticalHigh => Verdict::new(VerdictLevel::CriticalHigh, true),
        Interpretation::CriticalLow => Verdict::new(VerdictLevel::CriticalLow, true),
        Interpretation::Abnormal => Verdict::new(VerdictLevel::Abnormal, false),
        Interpretation::CriticalAbnormal => Verdict::new(VerdictLevel::Abnormal, true),
    }
}

fn from_range(value: f64, low: f64, high: f64) -> Verdict {
    let margin = (high - low) * CRITICAL_MARGIN_FACTOR;
    if value < low - margin {
        Verdict::new(VerdictLevel::CriticalLow, true)
    } else if value > high + margin {
        Verdict::new(VerdictLevel::CriticalHigh, true)
    } else if value < low {
        Verdict::new(VerdictLevel::Low, false)
    } else if value > high {
        Verdict::new(VerdictLevel::High, false)
    } else {
        Verdict::new(VerdictLevel::Normal, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReferenceRange, ResultCategory, ResultLifecycle, ResultValue};
    use chrono::Utc;

    fn with_value(magnitude: f64) -> ClinicalResult {
        ClinicalResult {
            id: "obs-1".into(),
            category: ResultCategory::Laboratory,
            code: Some("2345-7".into()),
            name: "Glucose".into(),
            value: Some(ResultValue::Quantity {
                magnitude,
                unit: "mg/dL".into(),
            }),
            reference_range: Some(ReferenceRange {
                low: Some(70.0),
                high: Some(100.0),
                unit: Some("mg/dL".into()),
                text: None,
            }),
            interpretation: None,
            effective_time: Utc::now(),
            lifecycle: ResultLifecycle::Final,
        }
    }

    #[test]
    fn margin_bands_for_span_70_to_100() {
        // margin = (100 - 70) * 0.2 = 6, so critical bounds are 64 and 106
        for (magnitude, level, critical) in [
            (63.0, VerdictLevel::CriticalLow, true),
            (65.0, VerdictLevel::Low, false),
            (85.0, VerdictLevel::Normal, false),
            (105.0, VerdictLevel::High, false),
            (107.0, VerdictLevel::CriticalHigh, true),
        ] {
            let verdict = classify(&with_value(magnitude));
            assert_eq!(verdict.level, level, "magnitude {magnitude}");
            assert_eq!(verdict.critical, critical, "magnitude {magnitude}");
        }
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert_eq!(classify(&with_value(70.0)).level, VerdictLevel::Normal);
        assert_eq!(classify(&with_value(100.0)).level, VerdictLevel::Normal);
        // Exactly on the critical bound is still only Low/High
        assert_eq!(classify(&with_value(64.0)).level, VerdictLevel::Low);
        assert_eq!(classify(&with_value(106.0)).level, VerdictLevel::High);
    }

    #[test]
    fn interpretation_overrides_in_range_value() {
        let mut result = with_value(85.0);
        result.interpretation = Some(Interpretation::CriticalHigh);
        let verdict = classify(&result);
        assert_eq!(verdict.level, VerdictLevel::CriticalHigh);
        assert!(verdict.critical);
    }

    #[test]
    fn abnormal_flags_map_to_abnormal() {
        let mut result = with_value(85.0);
        result.interpretation = Some(Interpretation::Abnormal);
        assert_eq!(
            classify(&result),
            Verdict::new(VerdictLevel::Abnormal, false)
        );
        result.interpretation = Some(Interpretation::CriticalAbnormal);
        assert_eq!(classify(&result), Verdict::new(VerdictLevel::Abnormal, true));
    }

    #[test]
    fn missing_information_defaults_to_normal() {
        let mut no_range = with_value(250.0);
        no_range.reference_range = None;
        assert_eq!(classify(&no_range).level, VerdictLevel::Normal);

        let mut text_value = with_value(0.0);
        text_value.value = Some(ResultValue::Text {
            text: "No growth".into(),
        });
        assert_eq!(classify(&text_value).level, VerdictLevel::Normal);

        let mut half_range = with_value(250.0);
        half_range.reference_range = Some(ReferenceRange {
            low: Some(70.0),
            high: None,
            unit: None,
            text: None,
        });
        assert_eq!(classify(&half_range).level, VerdictLevel::Normal);
    }

    #[test]
    fn level_strings_match_wire_format() {
        assert_eq!(VerdictLevel::CriticalHigh.as_str(), "critical_high");
        assert_eq!(VerdictLevel::Normal.as_str(), "normal");
    }
}
