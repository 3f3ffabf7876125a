#![warn(missing_docs)]
//! # Render Hooks
//!
//! Extension points of a component render pipeline.
//!
//! ## Overview
//!
//! A host renders a tree of [`Component`]s once per request. Around each
//! component it runs:
//! - **Renderer interceptors** before and after encoding, in invocation order
//! - **Component initializers** driven by normalized property metadata
//!
//! Both kinds of artifact are discovered through an [`ArtifactLocator`] and
//! cached, sorted, by an [`OrderedArtifactCache`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  RequestContext                      │
//! │   request id · typed attributes · user messages      │
//! └──────────────────────────┬───────────────────────────┘
//!                            │
//!      ┌─────────────────────┼──────────────────────┐
//!      ▼                     ▼                      ▼
//! ┌───────────┐   ┌─────────────────────┐   ┌───────────────┐
//! │ before    │──▶│ encode (host)       │──▶│ after         │
//! │ encode    │   └─────────────────────┘   │ encode        │
//! └─────┬─────┘                             └───────────────┘
//!       │ metadata
//!       ▼
//! ┌─────────────────────┐
//! │ ComponentInitializer│
//! └─────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use render_hooks::prelude::*;
//! use std::sync::Arc;
//!
//! let locator = StaticLocator::new().with_initializer(Arc::new(RequiredInitializer));
//! let artifacts = OrderedArtifactCache::new(Arc::new(locator));
//!
//! let mut ctx = RequestContext::new();
//! let mut component = Component::new("form:name", ComponentKind::InputText);
//! let mut metadata = MetadataMap::new();
//! metadata.insert(CommonMetadataKey::Required.to_string(), serde_json::Value::Bool(true));
//!
//! for initializer in artifacts.component_initializers().iter() {
//!     if initializer.is_supported(&component) {
//!         initializer.configure(&mut ctx, &mut component, &metadata);
//!     }
//! }
//! assert!(component.is_required());
//! ```

pub mod artifacts;
pub mod component;
pub mod context;
mod error;
pub mod initializer;
pub mod interceptor;
mod order;

pub use artifacts::{ArtifactLocator, OrderedArtifactCache, StaticLocator};
pub use component::{Component, ComponentKind};
pub use context::{RequestContext, RequestId, Severity, UserMessage};
pub use error::{HookError, HookResult};
pub use initializer::{CommonMetadataKey, ComponentInitializer, MetadataMap, RequiredInitializer};
pub use interceptor::{
    InterceptorOutcome, RendererInterceptor, run_after_encode, run_before_encode,
};
pub use order::{DEFAULT_INVOCATION_ORDER, InvocationOrdered};

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        ArtifactLocator, CommonMetadataKey, Component, ComponentInitializer, ComponentKind,
        DEFAULT_INVOCATION_ORDER, HookError, HookResult, InterceptorOutcome, InvocationOrdered,
        MetadataMap, OrderedArtifactCache, RendererInterceptor, RequestContext, RequestId,
        RequiredInitializer, Severity, StaticLocator, UserMessage, run_after_encode,
        run_before_encode,
    };
}
