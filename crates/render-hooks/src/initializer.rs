//! Component initializers
//!
//! Initializers receive the normalized metadata of the property a component
//! is bound to and adjust the component before it is encoded.

use crate::component::Component;
use crate::context::RequestContext;
use crate::order::InvocationOrdered;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

/// Normalized metadata keys understood by initializers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum CommonMetadataKey {
    /// A value must be supplied
    Required,
    /// Minimum text length
    MinLength,
    /// Maximum text length
    MaxLength,
    /// Regular expression the text must match
    Pattern,
}

impl CommonMetadataKey {
    /// Key under which the entry is stored in a [`MetadataMap`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Pattern => "pattern",
        }
    }
}

impl std::fmt::Display for CommonMetadataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one bound property, keyed by [`CommonMetadataKey::as_str`].
pub type MetadataMap = BTreeMap<String, Value>;

/// Adjusts a component from the metadata of its bound property.
pub trait ComponentInitializer: InvocationOrdered + Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Whether this initializer handles the given component.
    fn is_supported(&self, component: &Component) -> bool;

    /// Apply the metadata to the component.
    fn configure(&self, ctx: &mut RequestContext, component: &mut Component, metadata: &MetadataMap);
}

/// Marks text inputs as required when their property carries a required marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredInitializer;

impl InvocationOrdered for RequiredInitializer {
    fn invocation_order(&self) -> i32 {
        25
    }
}

impl ComponentInitializer for RequiredInitializer {
    fn name(&self) -> &str {
        "required"
    }

    fn is_supported(&self, component: &Component) -> bool {
        component.kind().is_text_input()
    }

    fn configure(&self, _ctx: &mut RequestContext, component: &mut Component, metadata: &MetadataMap) {
        if metadata.contains_key(CommonMetadataKey::Required.as_str()) {
            trace!(component = %component.client_id(), "marking component required");
            component.set_required(true);
        }
    }
}
