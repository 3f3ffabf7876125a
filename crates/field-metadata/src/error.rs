//! Error types for metadata extraction and deferred validation
//!
//! Lookups that find nothing are not errors: they return `None` or an empty
//! collection. A [`MetadataError`] always means the registered type table or
//! validator set is inconsistent with what a request asked of it, or that a
//! recorded value could not be written into a reconstructed object.
//!
//! # Example
//! ```rust,ignore
//! use field_metadata::{MetadataError, MetadataErrorCode};
//!
//! let error = MetadataError::not_constructible("DatesBean");
//! assert_eq!(error.code, MetadataErrorCode::NotConstructible);
//! assert!(error.code.is_configuration());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Type-safe error codes.
///
/// Serialized as SCREAMING_SNAKE_CASE (e.g. `NotConstructible` becomes
/// `"NOT_CONSTRUCTIBLE"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum MetadataErrorCode {
    /// The type table or configuration is inconsistent
    ConfigurationError,
    /// A group's target type has no default constructor
    NotConstructible,
    /// A recorded field has no setter on the target type
    MissingWriteTarget,
    /// Writing a recorded value into the target object failed
    ReflectiveInvocation,
    /// A constraint names a validator that is not registered
    UnresolvedValidator,
    /// JSON serialization/deserialization failed
    SerializationError,
}

impl MetadataErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::NotConstructible => "NOT_CONSTRUCTIBLE",
            Self::MissingWriteTarget => "MISSING_WRITE_TARGET",
            Self::ReflectiveInvocation => "REFLECTIVE_INVOCATION",
            Self::UnresolvedValidator => "UNRESOLVED_VALIDATOR",
            Self::SerializationError => "SERIALIZATION_ERROR",
        }
    }

    /// Returns true for errors caused by the registered types or validators
    /// rather than by request data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError
                | Self::NotConstructible
                | Self::MissingWriteTarget
                | Self::UnresolvedValidator
        )
    }
}

impl fmt::Display for MetadataErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error with a type-safe code and message.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct MetadataError {
    /// Type-safe error code
    pub code: MetadataErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Optional underlying cause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl MetadataError {
    /// Create a new error with code and message.
    pub fn new(code: MetadataErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Add a cause string for debugging.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Create a CONFIGURATION_ERROR error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(MetadataErrorCode::ConfigurationError, message)
    }

    /// Create a NOT_CONSTRUCTIBLE error for the given type.
    pub fn not_constructible(type_name: &str) -> Self {
        Self::new(
            MetadataErrorCode::NotConstructible,
            format!("Type '{}' has no default constructor", type_name),
        )
    }

    /// Create a MISSING_WRITE_TARGET error for the given property.
    pub fn missing_write_target(type_name: &str, property: &str) -> Self {
        Self::new(
            MetadataErrorCode::MissingWriteTarget,
            format!("Type '{}' has no writable property '{}'", type_name, property),
        )
    }

    /// Create a REFLECTIVE_INVOCATION error.
    pub fn reflective_invocation(message: impl Into<String>) -> Self {
        Self::new(MetadataErrorCode::ReflectiveInvocation, message)
    }

    /// Create an UNRESOLVED_VALIDATOR error.
    pub fn unresolved_validator(validator: &str, constraint: &str) -> Self {
        Self::new(
            MetadataErrorCode::UnresolvedValidator,
            format!(
                "Validator '{}' declared by constraint '{}' is not registered",
                validator, constraint
            ),
        )
    }

    /// Create a SERIALIZATION_ERROR error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(MetadataErrorCode::SerializationError, message)
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

/// Result type alias for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;
