//! Request-scoped recording and deferred evaluation of class-level constraints
//!
//! Field values that take part in a cross-field constraint are recorded as
//! the request processes them. At the end of the request the recorded values
//! are grouped by [`GroupKey`], one object per group is rebuilt from them and
//! validated, and only violations produced by the group's own validator are
//! reported to the user.
//!
//! The store lives in a [`RequestContext`] attribute. It is absent until the
//! first [`RecordingManager::record`], open afterwards, and gone once
//! [`RecordingManager::evaluate`] has taken it.

use crate::annotation::ValidatorId;
use crate::config::{FailurePolicy, ValidationConfig};
use crate::error::{MetadataError, MetadataResult};
use crate::reflection::ReflectionCache;
use crate::validation::ValidationEngine;
use render_hooks::{RequestContext, UserMessage};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Identity of one rebuilt object: the type to construct and the validator
/// whose violations are reported for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Type of the rebuilt object
    pub target_type: String,
    /// Validator the group is evaluated for
    pub validator: ValidatorId,
}

impl GroupKey {
    /// Create a key.
    pub fn new(target_type: impl Into<String>, validator: impl Into<ValidatorId>) -> Self {
        Self {
            target_type: target_type.into(),
            validator: validator.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target_type, self.validator)
    }
}

/// One recorded field write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedValue {
    /// Group the write belongs to
    pub key: GroupKey,
    /// Property written
    pub field: String,
    /// Value written; null means nothing to apply
    pub value: Value,
}

/// Recorded writes of one request, in recording order.
#[derive(Debug, Default)]
pub struct RecordingStore {
    values: Vec<RecordedValue>,
}

impl RecordingStore {
    fn push(&mut self, value: RecordedValue) {
        self.values.push(value);
    }

    /// Recorded writes in recording order.
    pub fn values(&self) -> &[RecordedValue] {
        &self.values
    }

    /// Number of recorded writes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Writes grouped by key. Groups keep first-seen order and writes keep
    /// recording order within a group.
    fn into_groups(self) -> Vec<(GroupKey, Vec<(String, Value)>)> {
        let mut groups: Vec<(GroupKey, Vec<(String, Value)>)> = Vec::new();
        for RecordedValue { key, field, value } in self.values {
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, writes)) => writes.push((field, value)),
                None => groups.push((key, vec![(field, value)])),
            }
        }
        groups
    }
}

/// Records field writes and evaluates them at the end of the request.
pub struct RecordingManager {
    cache: Arc<ReflectionCache>,
    engine: Arc<dyn ValidationEngine>,
    config: ValidationConfig,
}

impl RecordingManager {
    /// Create a manager.
    pub fn new(
        cache: Arc<ReflectionCache>,
        engine: Arc<dyn ValidationEngine>,
        config: ValidationConfig,
    ) -> Self {
        Self {
            cache,
            engine,
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Append a write to the request's store, opening it if needed.
    pub fn record(
        &self,
        ctx: &mut RequestContext,
        key: GroupKey,
        field: impl Into<String>,
        value: Value,
    ) {
        let field = field.into();
        trace!(request_id = %ctx.request_id().short(), group = %key, field = %field, "value recorded");
        ctx.attribute_or_insert_with(&self.config.recording_attribute, RecordingStore::default)
            .push(RecordedValue { key, field, value });
    }

    /// The request's store, if one is open.
    pub fn store<'a>(&self, ctx: &'a RequestContext) -> Option<&'a RecordingStore> {
        ctx.attribute::<RecordingStore>(&self.config.recording_attribute)
    }

    /// Rebuild and validate every recorded group.
    ///
    /// Returns `Ok(true)` when no attributed violation was found, including
    /// when nothing was recorded. Each attributed violation adds one error
    /// message to the context. The store is consumed, so a second call
    /// without new recordings returns `Ok(true)`.
    ///
    /// # Errors
    ///
    /// A group whose type is unregistered or not default-constructible, a
    /// recorded field without a setter, a write that does not fit, or a
    /// validation engine failure. See [`FailurePolicy`] for what happens to
    /// the other groups. When the remaining groups were evaluated, the error
    /// details carry `valid` (their combined result) and `failed_groups`.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id().short()))]
    pub fn evaluate(&self, ctx: &mut RequestContext) -> MetadataResult<bool> {
        let Some(store) = ctx.take_attribute::<RecordingStore>(&self.config.recording_attribute)
        else {
            trace!("nothing recorded");
            return Ok(true);
        };

        let mut valid = true;
        let mut failures: Vec<(GroupKey, MetadataError)> = Vec::new();

        for (key, writes) in store.into_groups() {
            match self.evaluate_group(ctx, &key, writes) {
                Ok(group_valid) => valid &= group_valid,
                Err(err) => {
                    error!(group = %key, code = %err.code, error = %err.message, "group evaluation failed");
                    match self.config.failure_policy {
                        FailurePolicy::AbortOnFirstFailure => return Err(err),
                        FailurePolicy::ContinueWithRemainingGroups => failures.push((key, err)),
                    }
                }
            }
        }

        let Some((_, first)) = failures.first() else {
            debug!(valid, "recorded groups evaluated");
            return Ok(valid);
        };
        let failed_groups: Vec<Value> = failures
            .iter()
            .map(|(key, err)| {
                json!({
                    "target_type": key.target_type,
                    "validator": key.validator,
                    "code": err.code,
                    "message": err.message,
                })
            })
            .collect();
        Err(first
            .clone()
            .with_details(json!({ "valid": valid, "failed_groups": failed_groups })))
    }

    fn evaluate_group(
        &self,
        ctx: &mut RequestContext,
        key: &GroupKey,
        writes: Vec<(String, Value)>,
    ) -> MetadataResult<bool> {
        let descriptor = self
            .cache
            .registry()
            .get_type(&key.target_type)
            .ok_or_else(|| {
                MetadataError::configuration(format!("Type '{}' is not registered", key.target_type))
            })?;
        let mut object = descriptor
            .instantiate()
            .ok_or_else(|| MetadataError::not_constructible(&key.target_type))?;

        for (field, value) in writes {
            if value.is_null() {
                trace!(group = %key, field = %field, "null value not applied");
                continue;
            }
            let setter = self
                .cache
                .resolve_setter(&key.target_type, &field)
                .ok_or_else(|| MetadataError::missing_write_target(&key.target_type, &field))?;
            setter.apply(object.as_mut(), value)?;
        }

        let violations = self
            .engine
            .validate(object.as_ref(), &self.config.default_group)?;

        let mut valid = true;
        for violation in violations {
            if violation.is_produced_by(&key.validator) {
                ctx.add_message(UserMessage::error(violation.message));
                valid = false;
            } else {
                debug!(
                    group = %key,
                    constraint = %violation.constraint,
                    "violation from another validator dropped"
                );
            }
        }
        Ok(valid)
    }
}

impl fmt::Debug for RecordingManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingManager")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(target: &str, validator: &str) -> GroupKey {
        GroupKey::new(target, validator)
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let mut store = RecordingStore::default();
        for (k, field) in [("B", "x"), ("A", "y"), ("B", "z")] {
            store.push(RecordedValue {
                key: key(k, "V"),
                field: field.to_string(),
                value: Value::Null,
            });
        }
        assert_eq!(store.len(), 3);

        let groups = store.into_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.target_type, "B");
        assert_eq!(
            groups[0].1.iter().map(|(f, _)| f.as_str()).collect::<Vec<_>>(),
            vec!["x", "z"]
        );
        assert_eq!(groups[1].0.target_type, "A");
    }

    #[test]
    fn test_same_type_different_validator_are_separate_groups() {
        let mut store = RecordingStore::default();
        store.push(RecordedValue {
            key: key("T", "V1"),
            field: "a".into(),
            value: Value::Null,
        });
        store.push(RecordedValue {
            key: key("T", "V2"),
            field: "a".into(),
            value: Value::Null,
        });
        assert_eq!(store.into_groups().len(), 2);
    }

    #[test]
    fn test_group_key_display() {
        assert_eq!(key("DatesBean", "DateRangeValidator").to_string(), "DatesBean/DateRangeValidator");
    }
}
