use super::metrics::{CacheStats, LookupMetrics};
use crate::annotation::Annotation;
use crate::error::MetadataResult;
use crate::registry::{FieldDescriptor, MethodDescriptor, TypeRegistry, bean_method_name};
use crate::value::ValueObject;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Getter resolved for a (type, property) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorHandle {
    owner_type: String,
    method: Arc<MethodDescriptor>,
}

impl AccessorHandle {
    /// Type declaring the getter.
    pub fn owner_type(&self) -> &str {
        &self.owner_type
    }

    /// Getter name, e.g. `getStartDate`.
    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    /// Annotations on the getter.
    pub fn annotations(&self) -> &[Annotation] {
        self.method.annotations()
    }
}

/// Field resolved for a (type, property) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldHandle {
    owner_type: String,
    field: Arc<FieldDescriptor>,
}

impl FieldHandle {
    /// Type declaring the field.
    pub fn owner_type(&self) -> &str {
        &self.owner_type
    }

    /// Field name; may carry a leading underscore.
    pub fn field_name(&self) -> &str {
        self.field.name()
    }

    /// Annotations on the field.
    pub fn annotations(&self) -> &[Annotation] {
        self.field.annotations()
    }
}

/// Setter resolved for a (type, property) pair, possibly inherited.
#[derive(Debug, Clone, PartialEq)]
pub struct SetterHandle {
    declaring_type: String,
    property: String,
    method: Arc<MethodDescriptor>,
}

impl SetterHandle {
    /// Type in the superclass chain that declares the setter.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Property written by the setter.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Setter name, e.g. `setEndDate`.
    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    /// Write `value` into `target` through this setter.
    pub fn apply(&self, target: &mut dyn ValueObject, value: Value) -> MetadataResult<()> {
        target.set_property(&self.property, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PropertyKey {
    owner_type: String,
    property: String,
}

impl PropertyKey {
    fn new(owner_type: &str, property: &str) -> Self {
        Self {
            owner_type: owner_type.to_string(),
            property: property.to_string(),
        }
    }
}

/// Process-wide memo of property lookups against a [`TypeRegistry`].
///
/// Safe to share between request threads. Both hits and misses are cached
/// and nothing is ever evicted. Two threads racing on the same pair may both
/// consult the table; the first insert wins and both see the same result.
pub struct ReflectionCache {
    registry: Arc<TypeRegistry>,
    accessors: DashMap<PropertyKey, Option<AccessorHandle>>,
    fields: DashMap<PropertyKey, Option<FieldHandle>>,
    setters: DashMap<PropertyKey, Option<SetterHandle>>,
    metrics: LookupMetrics,
}

impl ReflectionCache {
    /// Create an empty cache over the given registry.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            accessors: DashMap::new(),
            fields: DashMap::new(),
            setters: DashMap::new(),
            metrics: LookupMetrics::default(),
        }
    }

    /// The registry lookups are resolved against.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Getter declared on exactly `owner_type`: `get<Prop>`, then `is<Prop>`.
    pub fn resolve(&self, owner_type: &str, property: &str) -> Option<AccessorHandle> {
        self.lookup(&self.accessors, owner_type, property, "accessor", || {
            let descriptor = self.registry.get_type(owner_type)?;
            ["get", "is"].iter().find_map(|prefix| {
                descriptor
                    .declared_method(&bean_method_name(prefix, property))
                    .filter(|m| m.parameter_count() == 0)
                    .map(|method| AccessorHandle {
                        owner_type: owner_type.to_string(),
                        method: method.clone(),
                    })
            })
        })
    }

    /// Field declared on exactly `owner_type`: `<prop>`, then `_<prop>`.
    pub fn resolve_field(&self, owner_type: &str, property: &str) -> Option<FieldHandle> {
        self.lookup(&self.fields, owner_type, property, "field", || {
            let descriptor = self.registry.get_type(owner_type)?;
            descriptor
                .declared_field(property)
                .or_else(|| descriptor.declared_field(&format!("_{}", property)))
                .map(|field| FieldHandle {
                    owner_type: owner_type.to_string(),
                    field: field.clone(),
                })
        })
    }

    /// `set<Prop>` taking one argument, declared on `owner_type` or a superclass.
    pub fn resolve_setter(&self, owner_type: &str, property: &str) -> Option<SetterHandle> {
        self.lookup(&self.setters, owner_type, property, "setter", || {
            let name = bean_method_name("set", property);
            self.registry.ancestry(owner_type).iter().find_map(|descriptor| {
                descriptor
                    .declared_method(&name)
                    .filter(|m| m.parameter_count() == 1)
                    .map(|method| SetterHandle {
                        declaring_type: descriptor.name().to_string(),
                        property: property.to_string(),
                        method: method.clone(),
                    })
            })
        })
    }

    /// Current hit/miss counters and entry counts.
    pub fn stats(&self) -> CacheStats {
        let entries = self.accessors.len() + self.fields.len() + self.setters.len();
        let negative_entries = count_negative(&self.accessors)
            + count_negative(&self.fields)
            + count_negative(&self.setters);
        self.metrics.snapshot(entries, negative_entries)
    }

    fn lookup<H, F>(
        &self,
        map: &DashMap<PropertyKey, Option<H>>,
        owner_type: &str,
        property: &str,
        kind: &'static str,
        derive: F,
    ) -> Option<H>
    where
        H: Clone,
        F: FnOnce() -> Option<H>,
    {
        let key = PropertyKey::new(owner_type, property);
        if let Some(cached) = map.get(&key) {
            self.metrics.record_hit();
            return cached.value().clone();
        }

        self.metrics.record_miss();
        let resolved = derive();
        debug!(
            kind,
            owner_type,
            property,
            found = resolved.is_some(),
            "reflection cache miss"
        );
        map.entry(key).or_insert(resolved).value().clone()
    }
}

fn count_negative<H>(map: &DashMap<PropertyKey, Option<H>>) -> usize {
    map.iter().filter(|entry| entry.value().is_none()).count()
}

impl fmt::Debug for ReflectionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionCache")
            .field("types", &self.registry.type_count())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::keys;
    use crate::registry::{MethodDescriptor, TypeDescriptor};

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(
            TypeRegistry::with_builtin_annotations()
                .with_type(
                    TypeDescriptor::class("Base")
                        .field("_name", [Annotation::new(keys::NOT_NULL)])
                        .getter("name", [])
                        .setter("name"),
                )
                .with_type(
                    TypeDescriptor::class("Person")
                        .extends("Base")
                        .flag_getter("active", [])
                        .field("age", [])
                        .field("_age", [Annotation::new(keys::SIZE)])
                        .method(MethodDescriptor::new("getNickname", 1, [])),
                ),
        )
    }

    #[test]
    fn test_accessor_only_declared_on_type() {
        let cache = ReflectionCache::new(registry());
        assert_eq!(
            cache.resolve("Base", "name").map(|h| h.method_name().to_string()),
            Some("getName".to_string())
        );
        assert!(cache.resolve("Person", "name").is_none());
        assert_eq!(
            cache.resolve("Person", "active").map(|h| h.method_name().to_string()),
            Some("isActive".to_string())
        );
    }

    #[test]
    fn test_accessor_with_parameters_is_not_a_getter() {
        let cache = ReflectionCache::new(registry());
        assert!(cache.resolve("Person", "nickname").is_none());
    }

    #[test]
    fn test_field_plain_name_wins_over_underscore() {
        let cache = ReflectionCache::new(registry());
        let age = cache.resolve_field("Person", "age").unwrap();
        assert_eq!(age.field_name(), "age");
        assert!(age.annotations().is_empty());

        let name = cache.resolve_field("Base", "name").unwrap();
        assert_eq!(name.field_name(), "_name");
        assert_eq!(name.annotations()[0].kind(), keys::NOT_NULL);
    }

    #[test]
    fn test_setter_inherited_from_superclass() {
        let cache = ReflectionCache::new(registry());
        let setter = cache.resolve_setter("Person", "name").unwrap();
        assert_eq!(setter.declaring_type(), "Base");
        assert_eq!(setter.method_name(), "setName");
        assert!(cache.resolve_setter("Person", "active").is_none());
    }

    #[test]
    fn test_misses_are_cached() {
        let cache = ReflectionCache::new(registry());
        assert!(cache.resolve("Person", "missing").is_none());
        assert!(cache.resolve("Person", "missing").is_none());
        assert!(cache.resolve("Unknown", "x").is_none());

        let stats = cache.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.negative_entries, 2);
    }
}
