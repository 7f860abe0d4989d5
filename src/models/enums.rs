use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde representation.
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Sex {
    Male => "male",
    Female => "female",
    Unspecified => "unspecified",
});

str_enum!(Confidence {
    Exact => "exact",
    Inferred => "inferred",
});

str_enum!(ResultStatus {
    Normal => "normal",
    BorderlineLow => "borderline-low",
    BorderlineHigh => "borderline-high",
    AbnormalLow => "abnormal-low",
    AbnormalHigh => "abnormal-high",
    Unclassifiable => "unclassifiable",
});

impl Default for Sex {
    fn default() -> Self {
        Self::Unspecified
    }
}

impl Sex {
    /// Lenient parse for free text ("M", "MALE", "Female", "f").
    /// Anything unrecognized is `Unspecified`.
    pub fn parse_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" | "man" => Self::Male,
            "f" | "female" | "woman" => Self::Female,
            _ => Self::Unspecified,
        }
    }
}

/// Coarse severity used for per-category counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTier {
    Normal,
    Borderline,
    Abnormal,
    Unclassified,
}

impl ResultStatus {
    pub fn tier(&self) -> StatusTier {
        match self {
            Self::Normal => StatusTier::Normal,
            Self::BorderlineLow | Self::BorderlineHigh => StatusTier::Borderline,
            Self::AbnormalLow | Self::AbnormalHigh => StatusTier::Abnormal,
            Self::Unclassifiable => StatusTier::Unclassified,
        }
    }

    /// Flagged results are the ones worth highlighting: anything that was
    /// classified and is not normal.
    pub fn is_flagged(&self) -> bool {
        matches!(
            self.tier(),
            StatusTier::Borderline | StatusTier::Abnormal
        )
    }

    pub fn is_low(&self) -> bool {
        matches!(self, Self::BorderlineLow | Self::AbnormalLow)
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Self::BorderlineHigh | Self::AbnormalHigh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn result_status_round_trip() {
        for (variant, s) in [
            (ResultStatus::Normal, "normal"),
            (ResultStatus::BorderlineLow, "borderline-low"),
            (ResultStatus::BorderlineHigh, "borderline-high"),
            (ResultStatus::AbnormalLow, "abnormal-low"),
            (ResultStatus::AbnormalHigh, "abnormal-high"),
            (ResultStatus::Unclassifiable, "unclassifiable"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ResultStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&ResultStatus::BorderlineHigh).unwrap();
        assert_eq!(json, "\"borderline-high\"");
        let sex: Sex = serde_json::from_str("\"female\"").unwrap();
        assert_eq!(sex, Sex::Female);
    }

    #[test]
    fn invalid_enum_rejected() {
        let err = Confidence::from_str("guessed").unwrap_err();
        assert!(err.to_string().contains("Confidence"));
        assert!(err.to_string().contains("guessed"));
    }

    #[test]
    fn sex_parse_loose() {
        assert_eq!(Sex::parse_loose("MALE"), Sex::Male);
        assert_eq!(Sex::parse_loose(" f "), Sex::Female);
        assert_eq!(Sex::parse_loose("other"), Sex::Unspecified);
        assert_eq!(Sex::default(), Sex::Unspecified);
    }

    #[test]
    fn flagged_excludes_normal_and_unclassifiable() {
        assert!(!ResultStatus::Normal.is_flagged());
        assert!(!ResultStatus::Unclassifiable.is_flagged());
        assert!(ResultStatus::BorderlineLow.is_flagged());
        assert!(ResultStatus::AbnormalHigh.is_flagged());
    }

    #[test]
    fn tiers() {
        assert_eq!(ResultStatus::BorderlineHigh.tier(), StatusTier::Borderline);
        assert_eq!(ResultStatus::AbnormalLow.tier(), StatusTier::Abnormal);
        assert_eq!(ResultStatus::Unclassifiable.tier(), StatusTier::Unclassified);
    }
}
