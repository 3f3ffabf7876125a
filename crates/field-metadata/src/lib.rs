#![warn(missing_docs)]
//! # Field Metadata
//!
//! Declarative metadata for bound input fields and deferred cross-field
//! validation.
//!
//! ## Overview
//!
//! Types, their properties and the annotations on them are registered once in
//! a [`TypeRegistry`]. From there:
//! - **Extraction** collects every annotation reachable from a bound property
//!   across superclasses and interfaces, cached per `(type, property)`
//! - **Initialization** turns that metadata into a [`render_hooks::MetadataMap`]
//!   and hands it to the component initializers
//! - **Deferred validation** records values of `RecordValue` properties and,
//!   at the end of the request, rebuilds one object per group key and checks
//!   its class-level constraints
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐     ┌──────────────────┐     ┌─────────────────────┐
//! │ TypeRegistry   │────▶│ ReflectionCache  │────▶│ MetadataExtractor   │
//! │ types · annots │     │ (type, prop) ->  │     │ superclasses +      │
//! └───────┬────────┘     │ handle / miss    │     │ interfaces          │
//!         │              └────────┬─────────┘     └──────────┬──────────┘
//!         ▼                       │                          │ PropertyInformation
//! ┌────────────────┐              │               ┌──────────┴──────────┐
//! │ConstraintIndex │              │               ▼                     ▼
//! └───────┬────────┘              │     ┌──────────────────┐  ┌──────────────────┐
//!         │                       │     │MetadataInterceptor│ │DeferredValidation│
//!         ▼                       ▼     │ -> initializers  │  │ process / finish │
//! ┌──────────────────────────────────┐  └──────────────────┘  └────────┬─────────┘
//! │ RecordingManager                 │◀─────────────────────────────────┘
//! │ record · group · rebuild · check │──▶ ValidationEngine
//! └──────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use field_metadata::prelude::*;
//! use render_hooks::RequestContext;
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Default, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Dates {
//!     start_date: Option<String>,
//!     end_date: Option<String>,
//! }
//!
//! let registry = Arc::new(
//!     TypeRegistry::with_builtin_annotations().with_type(
//!         TypeDescriptor::class("Dates")
//!             .annotated(
//!                 Annotation::new(keys::DATE_RANGE)
//!                     .with_attribute("start", "startDate")
//!                     .with_attribute("end", "endDate"),
//!             )
//!             .field("startDate", [Annotation::new(keys::RECORD_VALUE)])
//!             .field("endDate", [Annotation::new(keys::RECORD_VALUE)])
//!             .setter("startDate")
//!             .setter("endDate")
//!             .constructible::<Dates>(),
//!     ),
//! );
//! let checks = Arc::new(ValidatorRegistry::with_builtins());
//! let cache = Arc::new(ReflectionCache::new(registry.clone()));
//! let engine = Arc::new(ConstraintEngine::new(registry.clone(), checks.clone()));
//! let manager = RecordingManager::new(cache, engine, ValidationConfig::default());
//! let deferred = DeferredValidation::new(
//!     ConstraintIndex::new(registry, checks),
//!     Arc::new(manager),
//! );
//!
//! let mut ctx = RequestContext::new();
//! let key = GroupKey::new("Dates", validators::DATE_RANGE);
//! deferred.manager().record(&mut ctx, key.clone(), "startDate", "2024-01-01".into());
//! deferred.manager().record(&mut ctx, key, "endDate", "2023-01-01".into());
//!
//! assert!(!deferred.finish(&mut ctx).unwrap());
//! assert_eq!(ctx.messages().len(), 1);
//! ```

pub mod annotation;
pub mod config;
pub mod constraints;
pub mod deferred;
mod error;
pub mod extractor;
pub mod interceptor;
pub mod property;
pub mod recording;
pub mod reflection;
pub mod registry;
pub mod transform;
pub mod validation;
pub mod value;

#[cfg(test)]
mod tests;

pub use annotation::{Annotation, AnnotationDeclaration, ValidatorId, keys, validators};
pub use config::{
    ConfigValidationError, DEFAULT_GROUP, DEFAULT_RECORDING_ATTRIBUTE, FailurePolicy,
    ValidationConfig,
};
pub use constraints::{ClassLevelConstraint, ConstraintIndex};
pub use deferred::DeferredValidation;
pub use error::{MetadataError, MetadataErrorCode, MetadataResult};
pub use extractor::{BindingResolver, ExpressionBindingResolver, MetadataExtractor};
pub use interceptor::{EXTRACTED_METADATA_ATTRIBUTE, MetadataInterceptor};
pub use property::{MetadataEntry, PropertyDescriptor, PropertyInformation};
pub use recording::{GroupKey, RecordedValue, RecordingManager, RecordingStore};
pub use reflection::{AccessorHandle, CacheStats, FieldHandle, ReflectionCache, SetterHandle};
pub use registry::{
    FieldDescriptor, MethodDescriptor, ROOT_TYPE, TypeDescriptor, TypeKind, TypeRegistry,
};
pub use transform::common_metadata;
pub use validation::{
    ConstraintEngine, ConstraintValidator, ConstraintViolation, ValidationEngine,
    ValidatorRegistry,
};
pub use value::{SerdeValueObject, ValueFactory, ValueObject};

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        Annotation, AnnotationDeclaration, ConstraintEngine, ConstraintIndex, ConstraintViolation,
        DeferredValidation, ExpressionBindingResolver, FailurePolicy, GroupKey, MetadataError,
        MetadataErrorCode, MetadataExtractor, MetadataInterceptor, MetadataResult,
        PropertyDescriptor, PropertyInformation, RecordingManager, ReflectionCache,
        SerdeValueObject, TypeDescriptor, TypeRegistry, ValidationConfig, ValidationEngine,
        ValidatorId, ValidatorRegistry, ValueObject, common_metadata, keys, validators,
    };
}
