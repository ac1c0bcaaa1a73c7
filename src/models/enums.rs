use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        $(#[$meta])*
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
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
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

str_enum!(
    #[serde(rename_all = "lowercase")]
    ScanType {
        Eyes => "eyes",
        Teeth => "teeth",
        Skin => "skin",
    }
);

impl ScanType {
    /// Parse an inbound scan-type tag. The singular `eye` is accepted as an
    /// alias of `eyes`; every entry path goes through here.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "eye" | "eyes" => Some(Self::Eyes),
            "teeth" | "tooth" => Some(Self::Teeth),
            "skin" => Some(Self::Skin),
            _ => None,
        }
    }
}

str_enum!(RiskTier {
    Low => "Low",
    Moderate => "Moderate",
    High => "High",
    Unknown => "Unknown",
    Error => "Error",
});

str_enum!(Category {
    Healthy => "Healthy",
    Concern => "Concern",
    Urgent => "Urgent",
    Inconclusive => "Inconclusive",
});

impl Category {
    /// Severity tier implied by a triage category.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Urgent => Severity::High,
            Self::Concern => Severity::Moderate,
            Self::Healthy | Self::Inconclusive => Severity::None,
        }
    }

    /// Map a backend's `result` value, accepting the legacy status names
    /// (`Good`, `Low`, `Critical`, `Invalid`) next to the triage names.
    pub fn from_reported(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "healthy" | "good" => Some(Self::Healthy),
            "concern" | "low" => Some(Self::Concern),
            "urgent" | "critical" => Some(Self::Urgent),
            "inconclusive" | "invalid" => Some(Self::Inconclusive),
            _ => None,
        }
    }
}

str_enum!(
    #[serde(rename_all = "lowercase")]
    Severity {
        None => "none",
        Moderate => "moderate",
        High => "high",
    }
);

str_enum!(
    #[serde(rename_all = "snake_case")]
    AnalysisPath {
        AiVision => "ai_vision",
        Heuristic => "heuristic",
        Unsupported => "unsupported",
    }
);

str_enum!(
    #[serde(rename_all = "snake_case")]
    DetectorKind {
        EyeRedness => "eye_redness",
        LensCloudiness => "lens_cloudiness",
        EyeFatigue => "eye_fatigue",
        TeethHygiene => "teeth_hygiene",
        Cavity => "cavity",
        GumInflammation => "gum_inflammation",
        SkinTone => "skin_tone",
        Mole => "mole",
        SkinTexture => "skin_texture",
    }
);
