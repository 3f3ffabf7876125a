//! Constraint validators and their registry

use crate::annotation::{Annotation, ValidatorId, validators};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Checks one constraint.
///
/// Property-level constraints receive the property value; class-level
/// constraints receive the whole object as a JSON object.
pub trait ConstraintValidator: Send + Sync {
    /// Whether `value` satisfies the constraint configured by `annotation`.
    fn is_valid(&self, annotation: &Annotation, value: &Value) -> bool;

    /// Message template used when the annotation carries no `message`.
    /// `{attribute}` placeholders are filled from the annotation.
    fn default_message(&self) -> &str;
}

/// Value must not be null.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotNullValidator;

impl ConstraintValidator for NotNullValidator {
    fn is_valid(&self, _annotation: &Annotation, value: &Value) -> bool {
        !value.is_null()
    }

    fn default_message(&self) -> &str {
        "must not be null"
    }
}

/// Length of a string, array or object must lie within `min..=max`.
///
/// Null is valid. Other JSON types are not sized and pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeValidator;

impl ConstraintValidator for SizeValidator {
    fn is_valid(&self, annotation: &Annotation, value: &Value) -> bool {
        let len = match value {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => return true,
        };
        let len = len as u64;
        let min = annotation.u64_attribute("min").unwrap_or(0);
        let max = annotation.u64_attribute("max").unwrap_or(u64::MAX);
        (min..=max).contains(&len)
    }

    fn default_message(&self) -> &str {
        "size must be between {min} and {max}"
    }
}

/// The whole string must match `regexp`.
///
/// Null and non-string values are valid. Compiled patterns are kept for the
/// lifetime of the validator; an invalid pattern fails every value.
#[derive(Debug, Default)]
pub struct PatternValidator {
    compiled: DashMap<String, Option<Regex>>,
}

impl PatternValidator {
    fn matches(&self, pattern: &str, text: &str) -> bool {
        if let Some(cached) = self.compiled.get(pattern) {
            return cached.value().as_ref().is_some_and(|re| re.is_match(text));
        }

        let compiled = match Regex::new(&format!("^(?:{})$", pattern)) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid validation regex pattern");
                None
            }
        };
        let matched = compiled.as_ref().is_some_and(|re| re.is_match(text));
        self.compiled.entry(pattern.to_string()).or_insert(compiled);
        matched
    }
}

impl ConstraintValidator for PatternValidator {
    fn is_valid(&self, annotation: &Annotation, value: &Value) -> bool {
        let Value::String(text) = value else {
            return true;
        };
        match annotation.str_attribute("regexp") {
            Some(pattern) => self.matches(pattern, text),
            None => {
                warn!("Pattern constraint without regexp attribute");
                false
            }
        }
    }

    fn default_message(&self) -> &str {
        "must match \"{regexp}\""
    }
}

/// Class-level: the `start` property must not be after the `end` property.
///
/// Both attributes name properties of the validated object. Values are ISO
/// dates (`2024-01-31`), naive date-times or RFC 3339 timestamps. If either
/// side is null the range is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRangeValidator;

impl DateRangeValidator {
    fn parse(value: &Value) -> Option<NaiveDateTime> {
        let text = value.as_str()?;
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
            return Some(timestamp.naive_utc());
        }
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}

impl ConstraintValidator for DateRangeValidator {
    fn is_valid(&self, annotation: &Annotation, value: &Value) -> bool {
        let (Some(start_property), Some(end_property)) =
            (annotation.str_attribute("start"), annotation.str_attribute("end"))
        else {
            warn!("DateRange constraint without start/end attributes");
            return false;
        };

        let start = value.get(start_property).unwrap_or(&Value::Null);
        let end = value.get(end_property).unwrap_or(&Value::Null);
        if start.is_null() || end.is_null() {
            return true;
        }

        match (Self::parse(start), Self::parse(end)) {
            (Some(start), Some(end)) => start <= end,
            _ => {
                debug!(%start, %end, "DateRange values are not dates");
                false
            }
        }
    }

    fn default_message(&self) -> &str {
        "{start} must not be after {end}"
    }
}

/// Validators by id.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<ValidatorId, Arc<dyn ConstraintValidator>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in validators.
    pub fn with_builtins() -> Self {
        Self::new()
            .with_validator(validators::NOT_NULL, Arc::new(NotNullValidator))
            .with_validator(validators::SIZE, Arc::new(SizeValidator))
            .with_validator(validators::PATTERN, Arc::new(PatternValidator::default()))
            .with_validator(validators::DATE_RANGE, Arc::new(DateRangeValidator))
    }

    /// Add a validator, replacing any with the same id.
    #[must_use = "This method returns a new ValidatorRegistry and does not modify self"]
    pub fn with_validator(
        mut self,
        id: impl Into<ValidatorId>,
        validator: Arc<dyn ConstraintValidator>,
    ) -> Self {
        self.validators.insert(id.into(), validator);
        self
    }

    /// Look up a validator.
    pub fn get(&self, id: &ValidatorId) -> Option<&Arc<dyn ConstraintValidator>> {
        self.validators.get(id)
    }

    /// Whether a validator is registered under `id`.
    pub fn contains(&self, id: &ValidatorId) -> bool {
        self.validators.contains_key(id)
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.validators.keys().map(ValidatorId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ValidatorRegistry").field("validators", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::keys;
    use serde_json::json;

    #[test]
    fn test_not_null() {
        let ann = Annotation::new(keys::NOT_NULL);
        assert!(NotNullValidator.is_valid(&ann, &json!("x")));
        assert!(!NotNullValidator.is_valid(&ann, &Value::Null));
    }

    #[test]
    fn test_size_bounds() {
        let ann = Annotation::new(keys::SIZE).with_attribute("min", 2).with_attribute("max", 4);
        assert!(!SizeValidator.is_valid(&ann, &json!("a")));
        assert!(SizeValidator.is_valid(&ann, &json!("abcd")));
        assert!(!SizeValidator.is_valid(&ann, &json!([1, 2, 3, 4, 5])));
        assert!(SizeValidator.is_valid(&ann, &Value::Null));
        assert!(SizeValidator.is_valid(&ann, &json!(12345)));
    }

    #[test]
    fn test_pattern_full_match_and_memoization() {
        let validator = PatternValidator::default();
        let ann = Annotation::new(keys::PATTERN).with_attribute("regexp", "[a-z]+");
        assert!(validator.is_valid(&ann, &json!("abc")));
        assert!(!validator.is_valid(&ann, &json!("abc1")));
        assert!(validator.is_valid(&ann, &Value::Null));
        assert_eq!(validator.compiled.len(), 1);

        let broken = Annotation::new(keys::PATTERN).with_attribute("regexp", "(");
        assert!(!validator.is_valid(&broken, &json!("(")));
        assert!(validator.compiled.get("(").is_some_and(|r| r.is_none()));
    }

    #[test]
    fn test_date_range() {
        let ann = Annotation::new(keys::DATE_RANGE)
            .with_attribute("start", "startDate")
            .with_attribute("end", "endDate");
        let check = |start: Value, end: Value| {
            DateRangeValidator.is_valid(&ann, &json!({"startDate": start, "endDate": end}))
        };

        assert!(check(json!("2023-01-01"), json!("2024-01-01")));
        assert!(check(json!("2024-01-01"), json!("2024-01-01")));
        assert!(!check(json!("2024-01-01"), json!("2023-01-01")));
        assert!(check(Value::Null, json!("2023-01-01")));
        assert!(!check(json!("2024-01-01T10:00:00Z"), json!("2024-01-01")));
        assert!(check(json!("2024-01-01T10:00:00+02:00"), json!("2024-01-01T09:00:00Z")));
        assert!(!check(json!("not a date"), json!("2024-01-01")));
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ValidatorRegistry::with_builtins();
        for id in [
            validators::NOT_NULL,
            validators::SIZE,
            validators::PATTERN,
            validators::DATE_RANGE,
        ] {
            assert!(registry.contains(&ValidatorId::new(id)));
        }
        assert!(registry.get(&ValidatorId::new("Missing")).is_none());
    }
}
