//! Declarative validation of value objects
//!
//! A [`ValidationEngine`] checks an object against the constraint annotations
//! registered for its type and returns the violations. [`ConstraintEngine`]
//! is the default engine over a [`TypeRegistry`] and a [`ValidatorRegistry`].
//!
//! # Example
//! ```rust,ignore
//! let engine = ConstraintEngine::new(registry, Arc::new(ValidatorRegistry::with_builtins()));
//! let violations = engine.validate(object.as_ref(), "Default")?;
//! for violation in &violations {
//!     println!("{}: {}", violation.constraint, violation.message);
//! }
//! ```

mod validators;

pub use validators::{
    ConstraintValidator, DateRangeValidator, NotNullValidator, PatternValidator, SizeValidator,
    ValidatorRegistry,
};

use crate::annotation::{Annotation, ValidatorId};
use crate::error::{MetadataError, MetadataResult};
use crate::registry::TypeRegistry;
use crate::value::ValueObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, trace};

/// A constraint that did not hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// Interpolated, user-facing message
    pub message: String,
    /// Property the constraint is declared on; `None` for class-level constraints
    pub property_path: Option<String>,
    /// Annotation kind of the constraint
    pub constraint: String,
    /// Validators declared for the constraint
    pub validator_classes: Vec<ValidatorId>,
    /// Value that was checked
    pub invalid_value: Value,
}

impl ConstraintViolation {
    /// Whether `validator` is one of the validators behind this violation.
    pub fn is_produced_by(&self, validator: &ValidatorId) -> bool {
        self.validator_classes.contains(validator)
    }
}

/// Validates objects against their declared constraints.
pub trait ValidationEngine: Send + Sync {
    /// Violations of the constraints in `group`.
    ///
    /// # Errors
    ///
    /// Configuration errors such as a constraint naming an unregistered
    /// validator, or an object that cannot be read.
    fn validate(&self, object: &dyn ValueObject, group: &str) -> MetadataResult<Vec<ConstraintViolation>>;
}

/// Default engine.
///
/// Checks property constraints declared on fields and getters of the type
/// and its superclasses, then constraints declared on the types themselves.
#[derive(Debug, Clone)]
pub struct ConstraintEngine {
    registry: Arc<TypeRegistry>,
    validators: Arc<ValidatorRegistry>,
}

impl ConstraintEngine {
    /// Create an engine.
    pub fn new(registry: Arc<TypeRegistry>, validators: Arc<ValidatorRegistry>) -> Self {
        Self {
            registry,
            validators,
        }
    }

    /// Registered validators.
    pub fn validators(&self) -> &Arc<ValidatorRegistry> {
        &self.validators
    }

    fn check(
        &self,
        annotation: &Annotation,
        value: &Value,
        property_path: Option<&str>,
        group: &str,
        violations: &mut Vec<ConstraintViolation>,
    ) -> MetadataResult<()> {
        if !annotation.in_group(group) {
            return Ok(());
        }
        let Some(declaration) = self.registry.annotation(annotation.kind()) else {
            return Ok(());
        };
        let ids = declaration.validated_by();

        let mut failed = None;
        for id in &ids {
            let Some(validator) = self.validators.get(id) else {
                error!(
                    validator = %id,
                    constraint = annotation.kind(),
                    "constraint validator is not registered"
                );
                return Err(MetadataError::unresolved_validator(id.as_str(), annotation.kind()));
            };
            if failed.is_none() && !validator.is_valid(annotation, value) {
                failed = Some(validator);
            }
        }

        if let Some(validator) = failed {
            let template = annotation
                .str_attribute(Annotation::MESSAGE)
                .unwrap_or_else(|| validator.default_message());
            trace!(constraint = annotation.kind(), property = ?property_path, "constraint violated");
            violations.push(ConstraintViolation {
                message: interpolate(template, annotation),
                property_path: property_path.map(str::to_string),
                constraint: annotation.kind().to_string(),
                validator_classes: ids,
                invalid_value: value.clone(),
            });
        }
        Ok(())
    }
}

impl ValidationEngine for ConstraintEngine {
    #[tracing::instrument(level = "debug", skip(self, object), fields(type_name = %object.type_name()))]
    fn validate(&self, object: &dyn ValueObject, group: &str) -> MetadataResult<Vec<ConstraintViolation>> {
        let state = object.to_value()?;
        let ancestry = self.registry.ancestry(object.type_name());
        let mut violations = Vec::new();

        for descriptor in &ancestry {
            for field in descriptor.fields() {
                let property = field.name().strip_prefix('_').unwrap_or(field.name());
                let value = state.get(property).unwrap_or(&Value::Null);
                for annotation in field.annotations() {
                    self.check(annotation, value, Some(property), group, &mut violations)?;
                }
            }
            for method in descriptor.methods() {
                let Some(property) = getter_property(method.name(), method.parameter_count()) else {
                    continue;
                };
                let value = state.get(&property).unwrap_or(&Value::Null);
                for annotation in method.annotations() {
                    self.check(annotation, value, Some(property.as_str()), group, &mut violations)?;
                }
            }
        }

        for descriptor in &ancestry {
            for annotation in descriptor.annotations() {
                self.check(annotation, &state, None, group, &mut violations)?;
            }
        }

        Ok(violations)
    }
}

/// `getStartDate` -> `startDate`, `isActive` -> `active`.
fn getter_property(method: &str, parameter_count: usize) -> Option<String> {
    if parameter_count != 0 {
        return None;
    }
    let rest = method
        .strip_prefix("get")
        .or_else(|| method.strip_prefix("is"))?;
    let mut chars = rest.chars();
    let first = chars.next().filter(|c| c.is_uppercase())?;
    Some(first.to_lowercase().chain(chars).collect())
}

/// Replace `{name}` with the annotation attribute `name`; unknown names stay.
fn interpolate(template: &str, annotation: &Annotation) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match annotation.attribute(name) {
            Some(Value::String(s)) => out.push_str(s),
            Some(other) => out.push_str(&other.to_string()),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationDeclaration, keys, validators};
    use crate::error::MetadataErrorCode;
    use crate::registry::TypeDescriptor;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Account {
        user_name: Option<String>,
        active: bool,
        start_date: Option<String>,
        end_date: Option<String>,
    }

    fn engine(registry: TypeRegistry) -> ConstraintEngine {
        ConstraintEngine::new(Arc::new(registry), Arc::new(ValidatorRegistry::with_builtins()))
    }

    fn account_registry() -> TypeRegistry {
        TypeRegistry::with_builtin_annotations()
            .with_type(
                TypeDescriptor::class("Account")
                    .annotated(
                        Annotation::new(keys::DATE_RANGE)
                            .with_attribute("start", "startDate")
                            .with_attribute("end", "endDate"),
                    )
                    .field("_userName", [Annotation::new(keys::NOT_NULL)])
                    .getter(
                        "userName",
                        [Annotation::new(keys::SIZE)
                            .with_attribute("min", 3)
                            .with_attribute(Annotation::MESSAGE, "between {min} and {max} chars")],
                    )
                    .flag_getter("active", [])
                    .constructible::<Account>(),
            )
    }

    fn build(account: Account) -> Box<dyn ValueObject> {
        Box::new(crate::value::SerdeValueObject::new("Account", account))
    }

    #[test]
    fn test_getter_property() {
        assert_eq!(getter_property("getStartDate", 0).as_deref(), Some("startDate"));
        assert_eq!(getter_property("isActive", 0).as_deref(), Some("active"));
        assert_eq!(getter_property("getStartDate", 1), None);
        assert_eq!(getter_property("getter", 0), None);
        assert_eq!(getter_property("setX", 0), None);
    }

    #[test]
    fn test_interpolate() {
        let ann = Annotation::new(keys::SIZE).with_attribute("min", 2).with_attribute("label", "name");
        assert_eq!(interpolate("{label} needs {min}..{max}", &ann), "name needs 2..{max}");
        assert_eq!(interpolate("unclosed {min", &ann), "unclosed {min");
        assert_eq!(interpolate("plain", &ann), "plain");
    }

    #[test]
    fn test_valid_object_has_no_violations() {
        let object = build(Account {
            user_name: Some("alice".into()),
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-02-01".into()),
            ..Account::default()
        });
        let violations = engine(account_registry()).validate(object.as_ref(), "Default").unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn test_property_and_class_level_violations() {
        let object = build(Account {
            user_name: Some("al".into()),
            start_date: Some("2024-01-01".into()),
            end_date: Some("2023-01-01".into()),
            ..Account::default()
        });
        let violations = engine(account_registry()).validate(object.as_ref(), "Default").unwrap();

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].constraint, keys::SIZE);
        assert_eq!(violations[0].property_path.as_deref(), Some("userName"));
        assert_eq!(violations[0].message, "between 3 and {max} chars");
        assert_eq!(violations[0].invalid_value, json!("al"));

        assert_eq!(violations[1].constraint, keys::DATE_RANGE);
        assert_eq!(violations[1].property_path, None);
        assert_eq!(violations[1].message, "startDate must not be after endDate");
        assert!(violations[1].is_produced_by(&ValidatorId::new(validators::DATE_RANGE)));
        assert!(!violations[1].is_produced_by(&ValidatorId::new(validators::NOT_NULL)));
    }

    #[test]
    fn test_underscore_field_maps_to_property() {
        let object = build(Account::default());
        let violations = engine(account_registry()).validate(object.as_ref(), "Default").unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint, keys::NOT_NULL);
        assert_eq!(violations[0].property_path.as_deref(), Some("userName"));
        assert_eq!(violations[0].message, "must not be null");
    }

    #[test]
    fn test_groups_filter_constraints() {
        let registry = TypeRegistry::with_builtin_annotations().with_type(
            TypeDescriptor::class("Account").field(
                "userName",
                [Annotation::new(keys::NOT_NULL).with_attribute(Annotation::GROUPS, json!(["Strict"]))],
            ),
        );
        let engine = engine(registry);
        let object = build(Account::default());

        assert!(engine.validate(object.as_ref(), "Default").unwrap().is_empty());
        assert_eq!(engine.validate(object.as_ref(), "Strict").unwrap().len(), 1);
    }

    #[test]
    fn test_unregistered_validator_fails_validation() {
        let registry = TypeRegistry::with_builtin_annotations()
            .with_annotation(AnnotationDeclaration::constraint("Custom", ["Unknown"]))
            .with_type(TypeDescriptor::class("Account").field("userName", [Annotation::new("Custom")]));
        let error = engine(registry)
            .validate(build(Account::default()).as_ref(), "Default")
            .unwrap_err();
        assert_eq!(error.code, MetadataErrorCode::UnresolvedValidator);
    }
}
