//! Configuration for deferred validation.
//!
//! # Example
//! ```rust,ignore
//! use field_metadata::{FailurePolicy, ValidationConfig};
//!
//! let config = ValidationConfig::new()
//!     .with_default_group("Default")
//!     .with_failure_policy(FailurePolicy::AbortOnFirstFailure);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request attribute slot used for the recording store unless configured otherwise.
pub const DEFAULT_RECORDING_ATTRIBUTE: &str = "field_metadata.recorded_values";

/// Validation group used when none is configured.
pub const DEFAULT_GROUP: &str = "Default";

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// default_group must not be empty
    EmptyDefaultGroup,
    /// recording_attribute must not be empty
    EmptyRecordingAttribute,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDefaultGroup => write!(f, "default_group must not be empty"),
            Self::EmptyRecordingAttribute => {
                write!(f, "recording_attribute must not be empty")
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// What evaluation does when one group fails to reconstruct or validate.
///
/// # Variants
///
/// * `ContinueWithRemainingGroups` - Keep evaluating the other groups, then
///   return the first failure with every failed group listed in its details.
///   Messages produced by the groups that did evaluate stay in the context.
///
/// * `AbortOnFirstFailure` - Return the failure immediately. Groups after the
///   failing one are not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FailurePolicy {
    /// Evaluate the remaining groups, then report.
    #[default]
    ContinueWithRemainingGroups,
    /// Stop at the first failing group.
    AbortOnFirstFailure,
}

/// Configuration shared by the recording manager and the validation engine.
///
/// # Fields
///
/// * `default_group` - Validation group used when reconstructed objects are
///   validated. Default: `"Default"`.
///
/// * `recording_attribute` - Request attribute slot holding the recording
///   store. Default: [`DEFAULT_RECORDING_ATTRIBUTE`].
///
/// * `failure_policy` - See [`FailurePolicy`]. Default:
///   `ContinueWithRemainingGroups`.
///
/// * `unwrap_proxies` - Map generated proxy types back to their entity type
///   before extracting metadata. Default: true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Validation group for reconstructed objects (default: "Default")
    pub default_group: String,
    /// Request attribute slot of the recording store
    pub recording_attribute: String,
    /// Behavior when a group fails (default: ContinueWithRemainingGroups)
    pub failure_policy: FailurePolicy,
    /// Unwrap proxy types before extraction (default: true)
    pub unwrap_proxies: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            default_group: DEFAULT_GROUP.to_string(),
            recording_attribute: DEFAULT_RECORDING_ATTRIBUTE.to_string(),
            failure_policy: FailurePolicy::default(),
            unwrap_proxies: true,
        }
    }
}

impl ValidationConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return an error if invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if `default_group` or `recording_attribute` is empty.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.default_group.trim().is_empty() {
            return Err(ConfigValidationError::EmptyDefaultGroup);
        }
        if self.recording_attribute.trim().is_empty() {
            return Err(ConfigValidationError::EmptyRecordingAttribute);
        }
        Ok(())
    }

    /// Set the validation group for reconstructed objects.
    #[must_use = "This method returns a new ValidationConfig and does not modify self"]
    pub fn with_default_group(mut self, group: impl Into<String>) -> Self {
        self.default_group = group.into();
        self
    }

    /// Set the request attribute slot of the recording store.
    #[must_use = "This method returns a new ValidationConfig and does not modify self"]
    pub fn with_recording_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.recording_attribute = attribute.into();
        self
    }

    /// Set the group failure policy.
    #[must_use = "This method returns a new ValidationConfig and does not modify self"]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enable or disable proxy unwrapping.
    #[must_use = "This method returns a new ValidationConfig and does not modify self"]
    pub fn with_unwrap_proxies(mut self, enabled: bool) -> Self {
        self.unwrap_proxies = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ValidationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_group, "Default");
        assert_eq!(config.failure_policy, FailurePolicy::ContinueWithRemainingGroups);
        assert!(config.unwrap_proxies);
    }

    #[test]
    fn test_empty_fields_rejected() {
        let config = ValidationConfig::new().with_default_group("  ");
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyDefaultGroup));

        let config = ValidationConfig::new().with_recording_attribute("");
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyRecordingAttribute)
        );
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: ValidationConfig =
            serde_json::from_str(r#"{"failure_policy":"abort_on_first_failure"}"#).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::AbortOnFirstFailure);
        assert_eq!(config.recording_attribute, DEFAULT_RECORDING_ATTRIBUTE);
    }
}
