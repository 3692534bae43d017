use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a wire string does not match any enum variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid {field}: '{value}'")]
    InvalidEnum { field: String, value: String },
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same wire strings as as_str.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DecodeError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ResultCategory {
    Laboratory => "laboratory",
    VitalSign => "vital_sign",
    DiagnosticReport => "diagnostic_report",
});

impl ResultCategory {
    /// Every bucket the store tracks, in bulk-load order.
    pub const ALL: [ResultCategory; 3] = [
        ResultCategory::Laboratory,
        ResultCategory::VitalSign,
        ResultCategory::DiagnosticReport,
    ];
}

str_enum!(ResultLifecycle {
    Pending => "pending",
    Final => "final",
    Corrected => "corrected",
    Cancelled => "cancelled",
});

// HL7 v2 interpretation abbreviations as they appear in OBX segments.
str_enum!(Interpretation {
    Normal => "N",
    High => "H",
    Low => "L",
    CriticalHigh => "HH",
    CriticalLow => "LL",
    Abnormal => "A",
    CriticalAbnormal => "AA",
});
