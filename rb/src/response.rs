//! Shape validation for status API payloads
//!
//! Nothing downstream reads a field of the payload until [`check_response`]
//! has accepted it.

use serde_json::Value;
use tracing::debug;

use crate::error::ResponseError;

/// A payload that passed shape checks
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResponse {
    /// Raw homework records, in the order the API sent them
    pub homeworks: Vec<Value>,

    /// Cursor for the next fetch, if the server reported one
    pub current_date: Option<i64>,
}

/// Check that a decoded payload is an object with a non-empty `homeworks` list
pub fn check_response(response: &Value) -> Result<ValidatedResponse, ResponseError> {
    let Some(object) = response.as_object() else {
        return Err(ResponseError::NotAnObject);
    };

    let homeworks = object.get("homeworks").ok_or(ResponseError::MissingField("homeworks"))?;
    let homeworks = homeworks.as_array().ok_or(ResponseError::NotAList)?;

    if homeworks.is_empty() {
        return Err(ResponseError::Empty);
    }

    let current_date = match object.get("current_date") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_i64().ok_or(ResponseError::InvalidCursor)?),
    };

    debug!(count = homeworks.len(), ?current_date, "check_response: accepted");
    Ok(ValidatedResponse {
        homeworks: homeworks.clone(),
        current_date,
    })
}
