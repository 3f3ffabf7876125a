//! Type-description table
//!
//! Types are described up front instead of being introspected at runtime.
//! A [`TypeRegistry`] is built once at startup, wrapped in an `Arc` and shared
//! read-only by every request.
//!
//! ```rust,ignore
//! let registry = TypeRegistry::with_builtin_annotations()
//!     .with_type(
//!         TypeDescriptor::class("DatesBean")
//!             .annotated(Annotation::new(keys::DATE_RANGE)
//!                 .with_attribute("start", "startDate")
//!                 .with_attribute("end", "endDate"))
//!             .field("startDate", [Annotation::new(keys::RECORD_VALUE)])
//!             .getter("startDate", [])
//!             .setter("startDate")
//!             .constructible::<DatesBean>(),
//!     );
//! ```

use crate::annotation::{Annotation, AnnotationDeclaration};
use crate::value::{SerdeValueObject, ValueFactory, ValueObject};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// The universal base type. Metadata is never read from it.
pub const ROOT_TYPE: &str = "Object";

/// Whether a described type is a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Concrete or abstract class; may declare fields
    Class,
    /// Interface; declares methods only
    Interface,
}

/// A declared method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    name: String,
    parameter_count: usize,
    annotations: Vec<Annotation>,
}

impl MethodDescriptor {
    /// Describe a method.
    pub fn new(
        name: impl Into<String>,
        parameter_count: usize,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_count,
            annotations: annotations.into_iter().collect(),
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters.
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Annotations on the method, in declaration order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    annotations: Vec<Annotation>,
}

impl FieldDescriptor {
    /// Describe a field.
    pub fn new(name: impl Into<String>, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        Self {
            name: name.into(),
            annotations: annotations.into_iter().collect(),
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotations on the field, in declaration order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// `get` + `startDate` -> `getStartDate`.
pub(crate) fn bean_method_name(prefix: &str, property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => {
            let mut name = String::with_capacity(prefix.len() + property.len());
            name.push_str(prefix);
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
            name
        }
        None => prefix.to_string(),
    }
}

/// Description of one class or interface.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    superclass: Option<String>,
    interfaces: Vec<String>,
    proxy_of: Option<String>,
    annotations: Vec<Annotation>,
    methods: Vec<Arc<MethodDescriptor>>,
    fields: Vec<Arc<FieldDescriptor>>,
    factory: Option<ValueFactory>,
}

impl TypeDescriptor {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            proxy_of: None,
            annotations: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            factory: None,
        }
    }

    /// Describe a class directly below the root type.
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Describe an interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Set the superclass. Naming [`ROOT_TYPE`] is the same as naming none.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        let superclass = superclass.into();
        self.superclass = (superclass != ROOT_TYPE).then_some(superclass);
        self
    }

    /// Add an implemented (or, for interfaces, extended) interface.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Mark this type as a generated proxy of `target`.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn proxy_of(mut self, target: impl Into<String>) -> Self {
        self.proxy_of = Some(target.into());
        self
    }

    /// Add a type-level annotation.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Declare a method.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    /// Declare a `get<Property>` accessor.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn getter(self, property: &str, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.method(MethodDescriptor::new(
            bean_method_name("get", property),
            0,
            annotations,
        ))
    }

    /// Declare an `is<Property>` accessor.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn flag_getter(
        self,
        property: &str,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        self.method(MethodDescriptor::new(
            bean_method_name("is", property),
            0,
            annotations,
        ))
    }

    /// Declare a `set<Property>` mutator.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn setter(self, property: &str) -> Self {
        self.method(MethodDescriptor::new(
            bean_method_name("set", property),
            1,
            [],
        ))
    }

    /// Declare a field.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn field(
        mut self,
        name: impl Into<String>,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        self.fields.push(Arc::new(FieldDescriptor::new(name, annotations)));
        self
    }

    /// Register a default constructor backed by `T::default()`.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn constructible<T>(mut self) -> Self
    where
        T: Default + Serialize + DeserializeOwned + Send + 'static,
    {
        self.factory = Some(SerdeValueObject::<T>::factory(self.name.clone()));
        self
    }

    /// Register a custom default constructor.
    #[must_use = "This method returns a new TypeDescriptor and does not modify self"]
    pub fn with_factory(mut self, factory: ValueFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class or interface.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Superclass, or `None` when directly below the root.
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Directly implemented interfaces, in declaration order.
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// The type this one proxies, if any.
    pub fn proxy_target(&self) -> Option<&str> {
        self.proxy_of.as_deref()
    }

    /// Type-level annotations declared on this type only.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// A method declared on this type only.
    pub fn declared_method(&self, name: &str) -> Option<&Arc<MethodDescriptor>> {
        self.methods.iter().find(|m| m.name() == name)
    }

    /// Methods declared on this type only, in declaration order.
    pub fn methods(&self) -> &[Arc<MethodDescriptor>] {
        &self.methods
    }

    /// Fields declared on this type only, in declaration order.
    pub fn fields(&self) -> &[Arc<FieldDescriptor>] {
        match self.kind {
            TypeKind::Class => self.fields.as_slice(),
            TypeKind::Interface => &[],
        }
    }

    /// A field declared on this type only. Interfaces have none.
    pub fn declared_field(&self, name: &str) -> Option<&Arc<FieldDescriptor>> {
        match self.kind {
            TypeKind::Class => self.fields.iter().find(|f| f.name() == name),
            TypeKind::Interface => None,
        }
    }

    /// Whether a default constructor is registered.
    pub fn is_constructible(&self) -> bool {
        self.factory.is_some()
    }

    /// Build a default instance, if a constructor is registered.
    pub fn instantiate(&self) -> Option<Box<dyn ValueObject>> {
        self.factory.as_ref().map(|factory| factory())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("superclass", &self.superclass)
            .field("interfaces", &self.interfaces)
            .field("proxy_of", &self.proxy_of)
            .field("annotations", &self.annotations.len())
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .field("constructible", &self.factory.is_some())
            .finish()
    }
}

/// Registered types and annotation declarations.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<TypeDescriptor>>,
    annotations: HashMap<String, Arc<AnnotationDeclaration>>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in annotation declarations.
    pub fn with_builtin_annotations() -> Self {
        AnnotationDeclaration::builtins()
            .into_iter()
            .fold(Self::new(), Self::with_annotation)
    }

    /// Add a type, replacing any type of the same name.
    #[must_use = "This method returns a new TypeRegistry and does not modify self"]
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Add an annotation declaration, replacing any of the same name.
    #[must_use = "This method returns a new TypeRegistry and does not modify self"]
    pub fn with_annotation(mut self, declaration: AnnotationDeclaration) -> Self {
        self.declare(declaration);
        self
    }

    /// Add a type in place.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
    }

    /// Add an annotation declaration in place.
    pub fn declare(&mut self, declaration: AnnotationDeclaration) {
        self.annotations
            .insert(declaration.name().to_string(), Arc::new(declaration));
    }

    /// Look up a type.
    pub fn get_type(&self, name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(name)
    }

    /// Look up an annotation declaration.
    pub fn annotation(&self, kind: &str) -> Option<&Arc<AnnotationDeclaration>> {
        self.annotations.get(kind)
    }

    /// Whether an annotation kind is a validation constraint. Unknown kinds are not.
    pub fn is_constraint(&self, kind: &str) -> bool {
        match self.annotation(kind) {
            Some(declaration) => declaration.is_constraint(),
            None => {
                warn!(kind, "annotation kind is not declared");
                false
            }
        }
    }

    /// Follow `proxy_of` links to the underlying type.
    pub fn unproxied<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        let mut seen = HashSet::new();
        while let Some(target) = self.get_type(current).and_then(|t| t.proxy_target()) {
            if !seen.insert(current) {
                warn!(type_name = name, "proxy chain loops back on itself");
                break;
            }
            current = target;
        }
        current
    }

    /// The type and its superclasses, most-derived first, excluding the root.
    ///
    /// The walk ends at the first unknown type name and at a superclass cycle.
    pub fn ancestry(&self, name: &str) -> Vec<Arc<TypeDescriptor>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = (name != ROOT_TYPE).then_some(name);

        while let Some(current) = next {
            if !seen.insert(current.to_string()) {
                warn!(type_name = name, at = current, "superclass cycle detected");
                break;
            }
            let Some(descriptor) = self.get_type(current) else {
                break;
            };
            chain.push(descriptor.clone());
            next = descriptor.superclass();
        }
        chain
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
