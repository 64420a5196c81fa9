use serde_json::Value;
use strum::Display;

/// Separator used when the backend reports several messages at once.
const MESSAGE_SEPARATOR: &str = ", ";

/// Errors raised by the REST client layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or(.body.as_str()))]
    Status {
        status: u16,
        /// Structured message pulled out of the error body, if any.
        message: Option<String>,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid API token: {0}")]
    InvalidToken(String),
}

impl ApiError {
    /// Text suitable for showing to the user.
    ///
    /// Prefers the structured message reported by the backend and falls back to
    /// the transport-level description of the failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Status { status, .. } => {
                format!("Request failed with status code {}", status)
            }
            ApiError::Request(err) => err.to_string(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Pulls a human readable message out of an error response body.
///
/// Looks for a `message` field at the top level, then inside `data` and
/// `error`, and finally accepts `error` itself when it is a plain string. A
/// list of strings is joined rather than shown raw.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let candidates = [
        value.get("message"),
        value.get("data").and_then(|data| data.get("message")),
        value.get("error").and_then(|error| error.get("message")),
        value.get("error"),
    ];

    let message = candidates.into_iter().flatten().find_map(message_text)?;
    Some(message)
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .filter(|part| !part.trim().is_empty())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(MESSAGE_SEPARATOR))
            }
        }
        _ => None,
    }
}

/// Coarse classification of workflow failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorCategory {
    ValidationError,
    PartialLookupFailure,
    BatchOperationFailure,
    SubmissionFailure,
    InvalidState,
}

/// Errors surfaced by the inventory check and stock-in workflows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Please choose a warehouse")]
    MissingWarehouse,

    #[error("Please add at least one product")]
    NoItems,

    #[error("Please select at least one product")]
    NoProductsSelected,

    #[error("Unknown warehouse: {0}")]
    UnknownWarehouse(String),

    #[error("Quantity for product {product_id} must be greater than zero")]
    InvalidQuantity { product_id: String },

    #[error("Failed to add products: {0}")]
    BatchOperationFailure(String),

    #[error("{0}")]
    SubmissionFailure(String),

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("This inventory check has already been submitted or discarded")]
    CheckClosed,
}

impl WorkflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkflowError::MissingWarehouse
            | WorkflowError::NoItems
            | WorkflowError::NoProductsSelected
            | WorkflowError::UnknownWarehouse(_)
            | WorkflowError::InvalidQuantity { .. } => ErrorCategory::ValidationError,
            WorkflowError::BatchOperationFailure(_) => ErrorCategory::BatchOperationFailure,
            WorkflowError::SubmissionFailure(_) => ErrorCategory::SubmissionFailure,
            WorkflowError::SubmissionInFlight | WorkflowError::CheckClosed => {
                ErrorCategory::InvalidState
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::ValidationError
    }
}

impl From<ApiError> for WorkflowError {
    fn from(err: ApiError) -> Self {
        WorkflowError::SubmissionFailure(err.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_message_lists() {
        let body = r#"{"statusCode":400,"message":["quantity must be an integer","warehouseId should not be empty"]}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("quantity must be an integer, warehouseId should not be empty")
        );
    }

    #[test]
    fn prefers_top_level_message() {
        let body = r#"{"message":"Warehouse is locked","error":"Bad Request"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Warehouse is locked")
        );
    }

    #[test]
    fn falls_back_to_nested_and_error_fields() {
        assert_eq!(
            extract_error_message(r#"{"data":{"message":"nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(
            extract_error_message(r#"{"error":"Conflict"}"#).as_deref(),
            Some("Conflict")
        );
    }

    #[test]
    fn error_object_message_beats_error_string() {
        let body = r#"{"error":{"message":"Warehouse W1 is archived"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Warehouse W1 is archived")
        );
    }

    #[test]
    fn ignores_unstructured_bodies() {
        assert_eq!(extract_error_message("<html>502</html>"), None);
        assert_eq!(extract_error_message(r#"{"message":[]}"#), None);
        assert_eq!(extract_error_message(r#"{"message":42}"#), None);
    }

    #[test]
    fn user_message_uses_transport_text_without_structured_message() {
        let err = ApiError::Status {
            status: 503,
            message: None,
            body: "upstream unavailable".into(),
        };
        assert_eq!(err.user_message(), "Request failed with status code 503");
        assert_eq!(err.status(), Some(503));

        let err = ApiError::Status {
            status: 400,
            message: Some("Duplicate check".into()),
            body: String::new(),
        };
        assert_eq!(err.user_message(), "Duplicate check");
    }

    #[test]
    fn categories_match_taxonomy() {
        assert_eq!(
            WorkflowError::MissingWarehouse.category(),
            ErrorCategory::ValidationError
        );
        assert_eq!(
            WorkflowError::BatchOperationFailure("boom".into()).category(),
            ErrorCategory::BatchOperationFailure
        );
        assert_eq!(
            WorkflowError::SubmissionFailure("no".into()).category(),
            ErrorCategory::SubmissionFailure
        );
        assert!(!WorkflowError::SubmissionInFlight.is_validation());
        assert_eq!(ErrorCategory::ValidationError.to_string(), "ValidationError");
    }
}
