//! Configuration tests - Property-based tests for ValidationConfig
//!
//! Tests that defaults are usable and that validation rejects empty slots.

use proptest::prelude::*;

use crate::config::{
    ConfigValidationError, DEFAULT_GROUP, DEFAULT_RECORDING_ATTRIBUTE, FailurePolicy,
    ValidationConfig,
};

// =============================================================================
// Property-Based Tests
// =============================================================================

proptest! {
    /// **Property 9: Configuration Defaults**
    /// *For any* ValidationConfig created with `Default::default()`, the
    /// configuration SHALL validate and use the default group and slot.
    #[test]
    fn prop_configuration_defaults_are_valid(_dummy in 0..1i32) {
        let config = ValidationConfig::default();

        prop_assert!(config.validate().is_ok());
        prop_assert_eq!(config.default_group.as_str(), DEFAULT_GROUP);
        prop_assert_eq!(config.recording_attribute.as_str(), DEFAULT_RECORDING_ATTRIBUTE);
        prop_assert_eq!(config.failure_policy, FailurePolicy::ContinueWithRemainingGroups);
        prop_assert!(config.unwrap_proxies);
    }

    /// Property: Blank names are rejected
    #[test]
    fn prop_blank_names_rejected(group in "[ ]{0,3}", attribute in "[a-z.]{1,20}") {
        let config = ValidationConfig::new()
            .with_default_group(group)
            .with_recording_attribute(attribute);
        prop_assert_eq!(config.validate(), Err(ConfigValidationError::EmptyDefaultGroup));
    }

    /// Property: Builder values survive a JSON round trip
    #[test]
    fn prop_builder_values_serialize(
        group in "[A-Za-z]{1,12}",
        attribute in "[a-z]{1,8}\\.[a-z]{1,8}",
        abort in any::<bool>(),
        unwrap in any::<bool>(),
    ) {
        let policy = if abort { FailurePolicy::AbortOnFirstFailure } else { FailurePolicy::ContinueWithRemainingGroups };
        let config = ValidationConfig::new()
            .with_default_group(group)
            .with_recording_attribute(attribute)
            .with_failure_policy(policy)
            .with_unwrap_proxies(unwrap);
        prop_assert!(config.validate().is_ok());

        let json = serde_json::to_string(&config).unwrap();
        let parsed: ValidationConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, config);
    }
}

#[test]
fn test_partial_json_uses_defaults() {
    let config: ValidationConfig =
        serde_json::from_str(r#"{"failure_policy": "abort_on_first_failure"}"#).unwrap();
    assert_eq!(config.failure_policy, FailurePolicy::AbortOnFirstFailure);
    assert_eq!(config.default_group, DEFAULT_GROUP);
}
