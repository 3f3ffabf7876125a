//! Reconstructed value objects
//!
//! Deferred validation rebuilds one object per group key from scattered
//! field writes. The object is built through its type's default factory and
//! then written property by property.

use crate::error::{MetadataError, MetadataResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// An object that can be written property by property and read back as JSON.
pub trait ValueObject: Send {
    /// Name of the registered type this object is an instance of.
    fn type_name(&self) -> &str;

    /// Write a single property.
    ///
    /// # Errors
    ///
    /// `MISSING_WRITE_TARGET` if the object has no such property,
    /// `REFLECTIVE_INVOCATION` if the value does not fit the property.
    fn set_property(&mut self, property: &str, value: Value) -> MetadataResult<()>;

    /// The current state as a JSON object keyed by property name.
    fn to_value(&self) -> MetadataResult<Value>;
}

/// Default-construction factory registered on a type.
pub type ValueFactory = Arc<dyn Fn() -> Box<dyn ValueObject> + Send + Sync>;

/// [`ValueObject`] over any serde type, written through its JSON form.
///
/// Every property must appear when `T` is serialized; properties hidden with
/// `skip_serializing_if` are not writable.
pub struct SerdeValueObject<T> {
    type_name: String,
    inner: T,
}

impl<T> SerdeValueObject<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    /// Wrap a value under the given registered type name.
    pub fn new(type_name: impl Into<String>, inner: T) -> Self {
        Self {
            type_name: type_name.into(),
            inner,
        }
    }

    /// Borrow the wrapped value.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Unwrap the value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> SerdeValueObject<T>
where
    T: Default + Serialize + DeserializeOwned + Send + 'static,
{
    /// Factory producing `T::default()` wrapped under `type_name`.
    pub fn factory(type_name: impl Into<String>) -> ValueFactory {
        let type_name: Arc<str> = Arc::from(type_name.into());
        Arc::new(move || -> Box<dyn ValueObject> {
            Box::new(Self::new(type_name.as_ref(), T::default()))
        })
    }
}

impl<T> ValueObject for SerdeValueObject<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn set_property(&mut self, property: &str, value: Value) -> MetadataResult<()> {
        let mut current = self.to_value()?;
        let Some(object) = current.as_object_mut() else {
            return Err(MetadataError::reflective_invocation(format!(
                "Type '{}' does not serialize to an object",
                self.type_name
            )));
        };
        let Some(slot) = object.get_mut(property) else {
            return Err(MetadataError::missing_write_target(&self.type_name, property));
        };
        *slot = value;

        self.inner = serde_json::from_value(current).map_err(|e| {
            MetadataError::reflective_invocation(format!(
                "Cannot write property '{}' of '{}'",
                property, self.type_name
            ))
            .with_cause(e.to_string())
        })?;
        Ok(())
    }

    fn to_value(&self) -> MetadataResult<Value> {
        Ok(serde_json::to_value(&self.inner)?)
    }
}

impl<T: fmt::Debug> fmt::Debug for SerdeValueObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeValueObject")
            .field("type_name", &self.type_name)
            .field("inner", &self.inner)
            .finish()
    }
}
