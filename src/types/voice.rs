//! Speaker voices offered by the speech endpoint.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Target speaker identity for synthesis.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Voice {
    /// Identifier sent in the `voice` field of a speech request.
    pub fn id(self) -> String {
        self.to_string()
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Alloy => "American female, clearly pronounced, deeper pitch",
            Self::Echo => "American male, young adult, slightly nasal",
            Self::Fable => "British male, clear, high-pitched",
            Self::Onyx => "Older American male, deepest voice, velvety",
            Self::Nova => "American female, highest-pitched, soft",
            Self::Shimmer => "American female, slightly nasal",
        }
    }

    pub fn all() -> Vec<Voice> {
        Voice::iter().collect()
    }
}
