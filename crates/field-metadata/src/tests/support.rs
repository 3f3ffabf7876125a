//! Shared fixtures: a dates bean with a class-level date range.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, keys};
use crate::config::ValidationConfig;
use crate::constraints::ConstraintIndex;
use crate::deferred::DeferredValidation;
use crate::recording::RecordingManager;
use crate::reflection::ReflectionCache;
use crate::registry::{TypeDescriptor, TypeRegistry};
use crate::validation::{ConstraintEngine, ValidatorRegistry};

pub const DATES_BEAN: &str = "DatesBean";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatesBean {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub fn dates_bean() -> TypeDescriptor {
    TypeDescriptor::class(DATES_BEAN)
        .annotated(
            Annotation::new(keys::DATE_RANGE)
                .with_attribute("start", "startDate")
                .with_attribute("end", "endDate"),
        )
        .field("startDate", [Annotation::new(keys::RECORD_VALUE)])
        .field(
            "endDate",
            [Annotation::new(keys::RECORD_VALUE), Annotation::new(keys::NOT_NULL)],
        )
        .getter("startDate", [])
        .getter("endDate", [])
        .setter("startDate")
        .setter("endDate")
        .constructible::<DatesBean>()
}

pub fn dates_registry() -> TypeRegistry {
    TypeRegistry::with_builtin_annotations().with_type(dates_bean())
}

pub fn manager(registry: TypeRegistry, config: ValidationConfig) -> RecordingManager {
    let registry = Arc::new(registry);
    let cache = Arc::new(ReflectionCache::new(registry.clone()));
    let engine = Arc::new(ConstraintEngine::new(
        registry,
        Arc::new(ValidatorRegistry::with_builtins()),
    ));
    RecordingManager::new(cache, engine, config)
}

pub fn deferred(registry: TypeRegistry) -> DeferredValidation {
    let manager = manager(registry.clone(), ValidationConfig::default());
    DeferredValidation::new(
        ConstraintIndex::new(Arc::new(registry), Arc::new(ValidatorRegistry::with_builtins())),
        Arc::new(manager),
    )
}

/// ISO date `days` days after 2000-01-01.
pub fn iso_date(days: i64) -> String {
    let base = chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    (base + chrono::Duration::days(days)).format("%Y-%m-%d").to_string()
}
