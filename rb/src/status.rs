//! Review status codes and their verdict text

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ItemError;

/// Review state of a single homework submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Taken by a reviewer
    Reviewing,
    /// Accepted without remarks
    Approved,
    /// Returned with remarks
    Rejected,
}

impl ReviewStatus {
    /// Every known status, in registry order
    pub const ALL: [ReviewStatus; 3] = [ReviewStatus::Approved, ReviewStatus::Reviewing, ReviewStatus::Rejected];

    /// Status code as the API reports it
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Reviewing => "reviewing",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// Human-readable verdict sent to the chat
    pub fn verdict(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            ReviewStatus::Reviewing => "Работа взята на проверку ревьюером.",
            ReviewStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reviewing" => Ok(Self::Reviewing),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ItemError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
