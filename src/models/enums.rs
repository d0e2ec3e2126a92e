use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a configuration string names no known variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct UnknownVariant {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(UnknownVariant {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ListKind {
    Elderly => "elderly",
    Pregnancy => "pregnancy",
    SplitTablet => "split_tablet",
    AgeSpecific => "age_specific",
    ConcurrentUse => "concurrent_use",
    EffectDuplication => "effect_duplication",
    DosageCaution => "dosage_caution",
    DurationCaution => "duration_caution",
    ProductInfo => "product_info",
});

impl ListKind {
    /// Operation path appended to the DUR service base URL.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Elderly => "getOdsnAtentInfoList03",
            Self::Pregnancy => "getPwnmTabooInfoList03",
            Self::SplitTablet => "getSeobangjeongPartitnAtentInfoList03",
            Self::AgeSpecific => "getSpcifyAgrdeTabooInfoList03",
            Self::ConcurrentUse => "getUsjntTabooInfoList03",
            Self::EffectDuplication => "getEfcyDplctInfoList03",
            Self::DosageCaution => "getCpctyAtentInfoList03",
            Self::DurationCaution => "getMdctnPdAtentInfoList03",
            Self::ProductInfo => "getDurPrdlstInfoList03",
        }
    }

    /// Display key under which this list is attached to a drug record.
    /// `None` for lists that are never rendered per drug.
    pub fn record_key(&self) -> Option<&'static str> {
        match self {
            Self::Elderly => Some("노인주의"),
            Self::Pregnancy => Some("임부금기"),
            Self::SplitTablet => Some("서방정분할주의"),
            Self::AgeSpecific => Some("특정연령금기"),
            Self::EffectDuplication => Some("효능군중복"),
            Self::DosageCaution => Some("용량주의"),
            Self::DurationCaution => Some("투여기간주의"),
            Self::ConcurrentUse | Self::ProductInfo => None,
        }
    }
}

str_enum!(EdgePolicy {
    AsReported => "as_reported",
    Canonical => "canonical",
});

impl Default for EdgePolicy {
    fn default() -> Self {
        Self::AsReported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn list_kind_parses_config_names() {
        assert_eq!(ListKind::from_str("elderly").unwrap(), ListKind::Elderly);
        assert_eq!(
            ListKind::from_str("split_tablet").unwrap(),
            ListKind::SplitTablet
        );
        assert_eq!(ListKind::AgeSpecific.as_str(), "age_specific");
    }

    #[test]
    fn unknown_list_kind_is_rejected() {
        let err = ListKind::from_str("weekend").unwrap_err();
        assert_eq!(err.field, "ListKind");
        assert_eq!(err.value, "weekend");
    }

    #[test]
    fn concurrent_use_is_not_rendered_per_drug() {
        assert!(ListKind::ConcurrentUse.record_key().is_none());
        assert_eq!(ListKind::Pregnancy.record_key(), Some("임부금기"));
    }

    #[test]
    fn operations_share_list03_suffix() {
        let kinds = [
            ListKind::Elderly,
            ListKind::Pregnancy,
            ListKind::SplitTablet,
            ListKind::AgeSpecific,
            ListKind::ConcurrentUse,
            ListKind::EffectDuplication,
            ListKind::DosageCaution,
            ListKind::DurationCaution,
            ListKind::ProductInfo,
        ];
        for kind in kinds {
            assert!(kind.operation().ends_with("InfoList03"), "{:?}", kind);
        }
    }

    #[test]
    fn edge_policy_defaults_to_as_reported() {
        assert_eq!(EdgePolicy::default(), EdgePolicy::AsReported);
        assert_eq!(
            EdgePolicy::from_str("canonical").unwrap(),
            EdgePolicy::Canonical
        );
    }
}
