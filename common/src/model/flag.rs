use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Yes/no attribute of a servidor (beard, baldness).
///
/// The values are persisted and exchanged with the UI as the literal Portuguese
/// words `"Sim"` and `"Não"`, which is also what the selection filters compare
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "Sim")]
    Sim,
    /// Registration forms that omit the field default to `Não`.
    #[default]
    #[serde(rename = "Não", alias = "Nao")]
    Nao,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Sim => "Sim",
            Flag::Nao => "Não",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is neither `Sim` nor `Não`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFlag(pub String);

impl fmt::Display for InvalidFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected 'Sim' or 'Não', got '{}'", self.0)
    }
}

impl std::error::Error for InvalidFlag {}

impl FromStr for Flag {
    type Err = InvalidFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Sim" | "sim" => Ok(Flag::Sim),
            "Não" | "não" | "Nao" | "nao" => Ok(Flag::Nao),
            other => Err(InvalidFlag(other.to_string())),
        }
    }
}
