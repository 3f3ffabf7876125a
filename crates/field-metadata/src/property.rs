//! Property descriptors and the metadata collected for them

use crate::annotation::Annotation;
use serde::{Deserialize, Serialize};

/// Identifies which property of which underlying type is being inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Registered type owning the property
    pub owner_type: String,
    /// Property name, e.g. `startDate`
    pub property: String,
    /// Reference to the bound instance, e.g. the bean name
    pub base_object: String,
}

impl PropertyDescriptor {
    /// Create a descriptor.
    pub fn new(
        owner_type: impl Into<String>,
        property: impl Into<String>,
        base_object: impl Into<String>,
    ) -> Self {
        Self {
            owner_type: owner_type.into(),
            property: property.into(),
            base_object: base_object.into(),
        }
    }
}

/// One piece of metadata found on a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Annotation kind
    pub key: String,
    /// The annotation instance
    pub value: Annotation,
}

impl MetadataEntry {
    /// Wrap an annotation, keyed by its kind.
    pub fn new(annotation: Annotation) -> Self {
        Self {
            key: annotation.kind().to_string(),
            value: annotation,
        }
    }
}

/// Metadata of one property, in discovery order.
///
/// Entries with the same key are kept side by side; a property annotated on
/// both field and getter carries both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInformation {
    details: PropertyDescriptor,
    entries: Vec<MetadataEntry>,
}

impl PropertyInformation {
    /// Start an empty collection for the given property.
    pub fn new(details: PropertyDescriptor) -> Self {
        Self {
            details,
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn push(&mut self, annotation: Annotation) {
        self.entries.push(MetadataEntry::new(annotation));
    }

    /// The property this information was collected for.
    pub fn property_details(&self) -> &PropertyDescriptor {
        &self.details
    }

    /// All entries in discovery order.
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    /// Entries with the given key.
    pub fn entries_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a MetadataEntry> + 'a {
        self.entries.iter().filter(move |e| e.key == key)
    }

    /// Whether any entry has the given key.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::keys;

    #[test]
    fn test_duplicates_are_appended() {
        let mut info = PropertyInformation::new(PropertyDescriptor::new("DatesBean", "endDate", "dates"));
        info.push(Annotation::new(keys::NOT_NULL));
        info.push(Annotation::new(keys::RECORD_VALUE));
        info.push(Annotation::new(keys::NOT_NULL));

        assert_eq!(info.len(), 3);
        assert_eq!(info.entries_for(keys::NOT_NULL).count(), 2);
        assert!(info.contains(keys::RECORD_VALUE));
        assert!(!info.contains(keys::SIZE));
        assert_eq!(info.property_details().property, "endDate");
    }
}
