//! Metadata extraction
//!
//! For a bound property, collects every annotation reachable from the owning
//! type: getter then field on each class from the most-derived type up to
//! (excluding) the root, plus getters declared on each implemented interface
//! and its superinterfaces. Each collected annotation also contributes the
//! non-structural annotations placed on its own declaration.

use crate::annotation::Annotation;
use crate::config::ValidationConfig;
use crate::property::{PropertyDescriptor, PropertyInformation};
use crate::reflection::ReflectionCache;
use render_hooks::{Component, RequestContext};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// Maps a component to the property its value is bound to.
pub trait BindingResolver: Send + Sync {
    /// The bound property, or `None` when the binding cannot be resolved.
    fn resolve(&self, ctx: &RequestContext, component: &Component) -> Option<PropertyDescriptor>;
}

/// Resolves `#{bean.property}` value expressions against a bean directory.
///
/// Only a single property step is understood; nested paths, method calls and
/// literal values resolve to nothing.
#[derive(Debug, Clone, Default)]
pub struct ExpressionBindingResolver {
    beans: HashMap<String, String>,
}

impl ExpressionBindingResolver {
    /// Create a resolver with no beans.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bean name and the type of the instance behind it.
    #[must_use = "This method returns a new ExpressionBindingResolver and does not modify self"]
    pub fn with_bean(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.beans.insert(name.into(), type_name.into());
        self
    }

    fn parse(expression: &str) -> Option<(&str, &str)> {
        let body = expression
            .trim()
            .strip_prefix("#{")
            .or_else(|| expression.trim().strip_prefix("${"))?
            .strip_suffix('}')?
            .trim();
        let (bean, property) = body.split_once('.')?;
        (is_identifier(bean) && is_identifier(property)).then_some((bean, property))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl BindingResolver for ExpressionBindingResolver {
    fn resolve(&self, _ctx: &RequestContext, component: &Component) -> Option<PropertyDescriptor> {
        let (bean, property) = Self::parse(component.value_expression()?)?;
        let type_name = self.beans.get(bean)?;
        Some(PropertyDescriptor::new(type_name.as_str(), property, bean))
    }
}

/// Collects the metadata of bound properties.
pub struct MetadataExtractor {
    cache: Arc<ReflectionCache>,
    resolver: Arc<dyn BindingResolver>,
    unwrap_proxies: bool,
}

impl MetadataExtractor {
    /// Create an extractor; proxy types are unwrapped.
    pub fn new(cache: Arc<ReflectionCache>, resolver: Arc<dyn BindingResolver>) -> Self {
        Self {
            cache,
            resolver,
            unwrap_proxies: true,
        }
    }

    /// Enable or disable proxy unwrapping.
    #[must_use = "This method returns a new MetadataExtractor and does not modify self"]
    pub fn with_unwrap_proxies(mut self, enabled: bool) -> Self {
        self.unwrap_proxies = enabled;
        self
    }

    /// Apply the extraction settings of a [`ValidationConfig`].
    #[must_use = "This method returns a new MetadataExtractor and does not modify self"]
    pub fn with_config(self, config: &ValidationConfig) -> Self {
        self.with_unwrap_proxies(config.unwrap_proxies)
    }

    /// The shared reflection cache.
    pub fn cache(&self) -> &Arc<ReflectionCache> {
        &self.cache
    }

    /// Metadata of the property a component is bound to.
    ///
    /// `None` for components that take no input and for bindings that do
    /// not resolve. Neither is a failure.
    pub fn extract(&self, ctx: &RequestContext, component: &Component) -> Option<PropertyInformation> {
        if !component.kind().is_input() {
            trace!(component = %component.client_id(), kind = %component.kind(), "not an input component");
            return None;
        }

        let Some(mut descriptor) = self.resolver.resolve(ctx, component) else {
            trace!(component = %component.client_id(), "value binding not resolved");
            return None;
        };

        if self.unwrap_proxies {
            let unproxied = self.cache.registry().unproxied(&descriptor.owner_type).to_string();
            descriptor.owner_type = unproxied;
        }

        Some(self.extract_property(descriptor))
    }

    /// Metadata of a known property.
    #[tracing::instrument(
        level = "trace",
        skip(self, descriptor),
        fields(owner_type = %descriptor.owner_type, property = %descriptor.property)
    )]
    pub fn extract_property(&self, descriptor: PropertyDescriptor) -> PropertyInformation {
        let registry = self.cache.registry();
        let property = descriptor.property.clone();
        let mut info = PropertyInformation::new(descriptor);
        let mut visited_interfaces = HashSet::new();

        for class in registry.ancestry(&info.property_details().owner_type) {
            if let Some(accessor) = self.cache.resolve(class.name(), &property) {
                self.collect(accessor.annotations(), &mut info);
            }
            if let Some(field) = self.cache.resolve_field(class.name(), &property) {
                self.collect(field.annotations(), &mut info);
            }
            self.visit_interfaces(class.interfaces(), &property, &mut visited_interfaces, &mut info);
        }

        trace!(entries = info.len(), "extraction finished");
        info
    }

    fn visit_interfaces(
        &self,
        interfaces: &[String],
        property: &str,
        visited: &mut HashSet<String>,
        info: &mut PropertyInformation,
    ) {
        for interface in interfaces {
            if !visited.insert(interface.clone()) {
                continue;
            }
            if let Some(accessor) = self.cache.resolve(interface, property) {
                self.collect(accessor.annotations(), info);
            }
            if let Some(descriptor) = self.cache.registry().get_type(interface) {
                self.visit_interfaces(descriptor.interfaces(), property, visited, info);
            }
        }
    }

    fn collect(&self, annotations: &[Annotation], info: &mut PropertyInformation) {
        for annotation in annotations {
            trace!(kind = annotation.kind(), "annotation found");
            info.push(annotation.clone());

            // One level only: meta-annotations of combined constraints are not expanded.
            if let Some(declaration) = self.cache.registry().annotation(annotation.kind()) {
                for combined in declaration.combined_constraints() {
                    trace!(
                        kind = combined.kind(),
                        via = annotation.kind(),
                        "combined constraint found"
                    );
                    info.push(combined.clone());
                }
            }
        }
    }
}

impl std::fmt::Debug for MetadataExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataExtractor")
            .field("cache", &self.cache)
            .field("unwrap_proxies", &self.unwrap_proxies)
            .finish()
    }
}
