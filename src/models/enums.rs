use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Trend {
    Worsening => "worsening",
    Improving => "improving",
    Stable => "stable",
    New => "new",
});

str_enum!(SafetyStatus {
    Safe => "safe",
    Caution => "caution",
    Danger => "danger",
});

str_enum!(Priority {
    High => "high",
    Medium => "medium",
    Low => "low",
});

str_enum!(InsightSource {
    Model => "model",
    Deterministic => "deterministic",
});

str_enum!(PerformanceScale {
    Ecog => "ecog",
    Karnofsky => "karnofsky",
});

str_enum!(PerformanceBadge {
    Good => "good",
    Moderate => "moderate",
    Poor => "poor",
    NotDocumented => "not_documented",
});

str_enum!(RecurrenceRisk {
    High => "high",
    Standard => "standard",
    NotDocumented => "not_documented",
});
