//! Deferred cross-field validation
//!
//! Properties marked with `RecordValue` have their submitted values recorded
//! instead of validated on the spot. At the end of the request every class-level
//! constraint of the owning type is checked once against an object rebuilt
//! from the recorded values.

use crate::annotation::keys;
use crate::constraints::ConstraintIndex;
use crate::error::MetadataResult;
use crate::property::PropertyInformation;
use crate::recording::{GroupKey, RecordingManager};
use render_hooks::RequestContext;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

/// Records submitted values and evaluates class-level constraints at request end.
#[derive(Debug, Clone)]
pub struct DeferredValidation {
    index: ConstraintIndex,
    manager: Arc<RecordingManager>,
}

impl DeferredValidation {
    /// Create a deferred validation step.
    pub fn new(index: ConstraintIndex, manager: Arc<RecordingManager>) -> Self {
        Self { index, manager }
    }

    /// The recording manager.
    pub fn manager(&self) -> &Arc<RecordingManager> {
        &self.manager
    }

    /// Record `value` for the property described by `info`.
    ///
    /// Nothing happens unless the property carries `RecordValue`. Otherwise
    /// the value is recorded once per validator of each class-level
    /// constraint on the owner type and its superclasses. The group targets
    /// the type declaring the constraint, so an inherited constraint rebuilds
    /// the superclass. Returns the number of groups the value was recorded
    /// under.
    ///
    /// # Errors
    ///
    /// `UNRESOLVED_VALIDATOR` when a class-level constraint names a validator
    /// that is not registered.
    #[tracing::instrument(
        level = "debug",
        skip(self, ctx, info, value),
        fields(
            owner_type = %info.property_details().owner_type,
            property = %info.property_details().property
        )
    )]
    pub fn process(
        &self,
        ctx: &mut RequestContext,
        info: &PropertyInformation,
        value: Value,
    ) -> MetadataResult<usize> {
        if !info.contains(keys::RECORD_VALUE) {
            return Ok(0);
        }

        let details = info.property_details();
        let constraints = self.index.class_level_constraints(&details.owner_type)?;
        let mut keys_seen = HashSet::new();

        for constraint in constraints {
            let key = GroupKey::new(constraint.declaring_type, constraint.validator);
            if keys_seen.insert(key.clone()) {
                self.manager.record(ctx, key, details.property.as_str(), value.clone());
            }
        }

        if keys_seen.is_empty() {
            trace!("owner type has no class-level constraints");
        }
        Ok(keys_seen.len())
    }

    /// Evaluate everything recorded in this request.
    ///
    /// # Errors
    ///
    /// See [`RecordingManager::evaluate`].
    pub fn finish(&self, ctx: &mut RequestContext) -> MetadataResult<bool> {
        self.manager.evaluate(ctx)
    }
}
