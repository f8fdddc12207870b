//! Homework records and notification text

use serde_json::Value;

use crate::error::ItemError;
use crate::status::ReviewStatus;

/// One homework submission as reported by the status API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homework {
    pub id: Option<String>,
    pub name: String,
    pub status: ReviewStatus,
}

impl Homework {
    /// Read a homework out of a raw record
    ///
    /// The name is checked before the status, so a record missing both
    /// reports `homework_name`.
    pub fn from_value(value: &Value) -> Result<Self, ItemError> {
        let record = value.as_object().ok_or(ItemError::NotAnObject)?;

        let name = record
            .get("homework_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ItemError::MissingField("homework_name"))?;

        let status = record
            .get("status")
            .and_then(Value::as_str)
            .ok_or(ItemError::MissingField("status"))?
            .parse::<ReviewStatus>()?;

        let id = match record.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Self {
            id,
            name: name.to_string(),
            status,
        })
    }

    /// Notification text for this homework
    pub fn message(&self) -> String {
        format!("Changed review status for \"{}\". {}", self.name, self.status.verdict())
    }
}

/// Compose the notification for one raw homework record
pub fn parse_status(value: &Value) -> Result<String, ItemError> {
    Homework::from_value(value).map(|hw| hw.message())
}
