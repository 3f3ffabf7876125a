//! Declarative metadata: annotation instances and annotation declarations
//!
//! An [`Annotation`] is a marker placed on a type, getter or field, carrying
//! an attribute bag. An [`AnnotationDeclaration`] describes an annotation
//! kind itself, including the annotations placed on that kind. A declaration
//! carrying [`keys::CONSTRAINT`] is a validation constraint and names the
//! validators that enforce it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Well-known annotation kinds.
pub mod keys {
    /// Structural: documentation marker
    pub const DOCUMENTED: &str = "Documented";
    /// Structural: retention policy
    pub const RETENTION: &str = "Retention";
    /// Structural: allowed placement targets
    pub const TARGET: &str = "Target";
    /// Marks an annotation kind as a validation constraint
    pub const CONSTRAINT: &str = "Constraint";
    /// Value must be present
    pub const NOT_NULL: &str = "NotNull";
    /// Length bounds for strings and arrays
    pub const SIZE: &str = "Size";
    /// Regular expression the string must match
    pub const PATTERN: &str = "Pattern";
    /// Class-level: `start` property must not be after `end` property
    pub const DATE_RANGE: &str = "DateRange";
    /// Field value is recorded for deferred class-level validation
    pub const RECORD_VALUE: &str = "RecordValue";
}

/// Built-in validator ids.
pub mod validators {
    /// Enforces [`super::keys::NOT_NULL`]
    pub const NOT_NULL: &str = "NotNullValidator";
    /// Enforces [`super::keys::SIZE`]
    pub const SIZE: &str = "SizeValidator";
    /// Enforces [`super::keys::PATTERN`]
    pub const PATTERN: &str = "PatternValidator";
    /// Enforces [`super::keys::DATE_RANGE`]
    pub const DATE_RANGE: &str = "DateRangeValidator";
}

/// Structural annotation kinds skipped when expanding combined constraints.
pub const EXCLUDED_META_ANNOTATIONS: [&str; 3] = [keys::DOCUMENTED, keys::RETENTION, keys::TARGET];

/// Whether a kind belongs to the fixed structural exclusion set.
pub fn is_excluded(kind: &str) -> bool {
    EXCLUDED_META_ANNOTATIONS.contains(&kind)
}

/// Identifier of a registered constraint validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorId(String);

impl ValidatorId {
    /// Create a validator id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ValidatorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ValidatorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A declarative metadata instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    attributes: Map<String, Value>,
}

impl Annotation {
    /// Attribute listing the groups a constraint belongs to.
    pub const GROUPS: &'static str = "groups";
    /// Attribute overriding the violation message.
    pub const MESSAGE: &'static str = "message";

    /// Create an annotation with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Map::new(),
        }
    }

    /// Set an attribute.
    #[must_use = "This method returns a new Annotation and does not modify self"]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// The annotation kind (its fully qualified name).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// All attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// A single attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// A string attribute; other JSON types count as absent.
    pub fn str_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// An unsigned integer attribute; other JSON types count as absent.
    pub fn u64_attribute(&self, name: &str) -> Option<u64> {
        self.attributes.get(name).and_then(Value::as_u64)
    }

    /// Groups this annotation participates in. Defaults to `["Default"]`.
    pub fn groups(&self) -> Vec<String> {
        match self.attributes.get(Self::GROUPS) {
            Some(Value::Array(groups)) if !groups.is_empty() => groups
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(group)) => vec![group.clone()],
            _ => vec![crate::config::DEFAULT_GROUP.to_string()],
        }
    }

    /// Whether this annotation participates in the given group.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups().iter().any(|g| g == group)
    }
}

/// The declaration of an annotation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDeclaration {
    name: String,
    #[serde(default)]
    meta_annotations: Vec<Annotation>,
}

impl AnnotationDeclaration {
    /// Attribute of [`keys::CONSTRAINT`] listing validator ids.
    pub const VALIDATED_BY: &'static str = "validatedBy";

    /// Declare a plain annotation kind with the usual structural markers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meta_annotations: vec![
                Annotation::new(keys::DOCUMENTED),
                Annotation::new(keys::RETENTION).with_attribute("value", "RUNTIME"),
                Annotation::new(keys::TARGET),
            ],
        }
    }

    /// Declare a constraint kind enforced by the given validators.
    pub fn constraint<I, V>(name: impl Into<String>, validated_by: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ValidatorId>,
    {
        let ids: Vec<Value> = validated_by
            .into_iter()
            .map(|v| {
                let id: ValidatorId = v.into();
                Value::String(id.0)
            })
            .collect();
        Self::new(name).with_meta(
            Annotation::new(keys::CONSTRAINT).with_attribute(Self::VALIDATED_BY, ids),
        )
    }

    /// Place another annotation on this declaration.
    #[must_use = "This method returns a new AnnotationDeclaration and does not modify self"]
    pub fn with_meta(mut self, annotation: Annotation) -> Self {
        self.meta_annotations.push(annotation);
        self
    }

    /// The kind being declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotations placed on the declaration, in declaration order.
    pub fn meta_annotations(&self) -> &[Annotation] {
        &self.meta_annotations
    }

    /// Meta-annotations that are not in the structural exclusion set.
    pub fn combined_constraints(&self) -> impl Iterator<Item = &Annotation> {
        self.meta_annotations.iter().filter(|a| !is_excluded(a.kind()))
    }

    /// Whether this kind is a validation constraint.
    pub fn is_constraint(&self) -> bool {
        self.constraint_marker().is_some()
    }

    /// Validators enforcing this constraint; empty for non-constraints.
    pub fn validated_by(&self) -> Vec<ValidatorId> {
        let Some(marker) = self.constraint_marker() else {
            return Vec::new();
        };
        match marker.attribute(Self::VALIDATED_BY) {
            Some(Value::Array(ids)) => ids
                .iter()
                .filter_map(Value::as_str)
                .map(ValidatorId::new)
                .collect(),
            Some(Value::String(id)) => vec![ValidatorId::new(id.as_str())],
            _ => Vec::new(),
        }
    }

    fn constraint_marker(&self) -> Option<&Annotation> {
        self.meta_annotations
            .iter()
            .find(|a| a.kind() == keys::CONSTRAINT)
    }

    /// Declarations of the structural kinds, `RecordValue` and the built-in constraints.
    pub fn builtins() -> Vec<AnnotationDeclaration> {
        vec![
            Self::new(keys::DOCUMENTED),
            Self::new(keys::RETENTION),
            Self::new(keys::TARGET),
            Self::new(keys::CONSTRAINT),
            Self::new(keys::RECORD_VALUE),
            Self::constraint(keys::NOT_NULL, [validators::NOT_NULL]),
            Self::constraint(keys::SIZE, [validators::SIZE]),
            Self::constraint(keys::PATTERN, [validators::PATTERN]),
            Self::constraint(keys::DATE_RANGE, [validators::DATE_RANGE]),
        ]
    }
}
