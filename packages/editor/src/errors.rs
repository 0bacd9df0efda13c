//! Error types for the editor

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A way to pay for a gated download, as offered by the billing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOption {
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Failures reported by the document service or the transport to it
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Payment required: {message}")]
    PaymentRequired {
        reason: String,
        message: String,
        payment_options: Vec<PaymentOption>,
    },

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Input rejected before any call is made
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Logo file is too large ({size} bytes, maximum is {limit} bytes)")]
    LogoTooLarge { size: usize, limit: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not mint a document id distinct from {0}")]
    IdentityUnavailable(String),

    #[error("Session is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_option_accepts_type_alias() {
        let option: PaymentOption =
            serde_json::from_str(r#"{"type": "single_document", "price": 9.99}"#).unwrap();
        assert_eq!(option.kind, "single_document");
        assert_eq!(option.price, Some(9.99));
        assert!(option.label.is_none());
    }

    #[test]
    fn test_error_messages() {
        let error = EditorError::from(ValidationError::LogoTooLarge {
            size: 6,
            limit: 5,
        });
        assert_eq!(
            error.to_string(),
            "Logo file is too large (6 bytes, maximum is 5 bytes)"
        );
    }
}
