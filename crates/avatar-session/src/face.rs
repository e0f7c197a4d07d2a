//! Avatar face animation states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of face animations the display can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Confused,
    Curious,
    Excited,
    #[default]
    Happy,
    Sad,
    Think,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Confused,
        Face::Curious,
        Face::Excited,
        Face::Happy,
        Face::Sad,
        Face::Think,
    ];

    /// Neutral face shown after (re)connecting.
    pub const NEUTRAL: Face = Face::Happy;

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confused => "confused",
            Self::Curious => "curious",
            Self::Excited => "excited",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Think => "think",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown avatar face: {0}")]
pub struct UnknownFace(pub String);

impl FromStr for Face {
    type Err = UnknownFace;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Face::ALL
            .into_iter()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| UnknownFace(s.to_string()))
    }
}
