//! Class-level constraint index

use crate::annotation::{Annotation, ValidatorId};
use crate::error::{MetadataError, MetadataResult};
use crate::registry::TypeRegistry;
use crate::validation::ValidatorRegistry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// A type-level constraint paired with one validator enforcing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassLevelConstraint {
    /// The constraint annotation as declared on the type
    pub annotation: Annotation,
    /// One of the validators named by the constraint's declaration
    pub validator: ValidatorId,
    /// Type in the superclass chain carrying the annotation
    pub declaring_type: String,
}

/// Finds the class-level constraints of a type and the validators behind them.
#[derive(Debug, Clone)]
pub struct ConstraintIndex {
    registry: Arc<TypeRegistry>,
    validators: Arc<ValidatorRegistry>,
}

impl ConstraintIndex {
    /// Create an index over the given type table and validators.
    pub fn new(registry: Arc<TypeRegistry>, validators: Arc<ValidatorRegistry>) -> Self {
        Self {
            registry,
            validators,
        }
    }

    /// One entry per (constraint, validator) pair declared on the type and
    /// its superclasses, most-derived type first, excluding the root.
    ///
    /// # Errors
    ///
    /// `UNRESOLVED_VALIDATOR` when a constraint names a validator that is not
    /// registered.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn class_level_constraints(
        &self,
        type_name: &str,
    ) -> MetadataResult<Vec<ClassLevelConstraint>> {
        let mut result = Vec::new();

        for descriptor in self.registry.ancestry(type_name) {
            for annotation in descriptor.annotations() {
                if !self.registry.is_constraint(annotation.kind()) {
                    debug!(kind = annotation.kind(), "non-constraint type-level annotation skipped");
                    continue;
                }
                let Some(declaration) = self.registry.annotation(annotation.kind()) else {
                    continue;
                };

                for validator in declaration.validated_by() {
                    if !self.validators.contains(&validator) {
                        error!(
                            validator = %validator,
                            constraint = annotation.kind(),
                            declaring_type = descriptor.name(),
                            "constraint validator is not registered"
                        );
                        return Err(MetadataError::unresolved_validator(
                            validator.as_str(),
                            annotation.kind(),
                        )
                        .with_details(serde_json::json!({ "type": descriptor.name() })));
                    }
                    result.push(ClassLevelConstraint {
                        annotation: annotation.clone(),
                        validator,
                        declaring_type: descriptor.name().to_string(),
                    });
                }
            }
        }

        Ok(result)
    }
}
