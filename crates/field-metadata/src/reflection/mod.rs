//! Memoized property lookups
//!
//! Resolving the getter, field or setter of a property walks the type table.
//! [`ReflectionCache`] does that walk once per (type, property) pair for the
//! lifetime of the process and remembers "not found" just like a hit.

mod cache;
mod metrics;

pub use cache::{AccessorHandle, FieldHandle, ReflectionCache, SetterHandle};
pub use metrics::CacheStats;
