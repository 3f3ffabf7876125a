//! Ordered artifact cache
//!
//! Discovering interceptors and initializers goes through an
//! [`ArtifactLocator`], which may be expensive. The cache asks the locator at
//! most once per artifact kind, sorts the result by invocation order and then
//! serves the same immutable slice for the rest of its lifetime.
//!
//! ```rust,ignore
//! let locator = StaticLocator::new()
//!     .with_initializer(Arc::new(RequiredInitializer))
//!     .with_interceptor(Arc::new(metadata_interceptor));
//! let artifacts = OrderedArtifactCache::new(Arc::new(locator));
//!
//! for init in artifacts.component_initializers().iter() {
//!     // ...
//! }
//! ```

use crate::initializer::ComponentInitializer;
use crate::interceptor::RendererInterceptor;
use crate::order::sort_by_invocation_order;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::debug;

/// Source of pluggable artifacts.
pub trait ArtifactLocator: Send + Sync {
    /// All renderer interceptors, in discovery order.
    fn renderer_interceptors(&self) -> Vec<Arc<dyn RendererInterceptor>>;

    /// All component initializers, in discovery order.
    fn component_initializers(&self) -> Vec<Arc<dyn ComponentInitializer>>;
}

/// Locator over an explicitly registered set of artifacts.
#[derive(Default, Clone)]
pub struct StaticLocator {
    interceptors: Vec<Arc<dyn RendererInterceptor>>,
    initializers: Vec<Arc<dyn ComponentInitializer>>,
}

impl StaticLocator {
    /// Create an empty locator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer interceptor.
    #[must_use = "This method returns a new StaticLocator and does not modify self"]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn RendererInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Register a component initializer.
    #[must_use = "This method returns a new StaticLocator and does not modify self"]
    pub fn with_initializer(mut self, initializer: Arc<dyn ComponentInitializer>) -> Self {
        self.initializers.push(initializer);
        self
    }
}

impl ArtifactLocator for StaticLocator {
    fn renderer_interceptors(&self) -> Vec<Arc<dyn RendererInterceptor>> {
        self.interceptors.clone()
    }

    fn component_initializers(&self) -> Vec<Arc<dyn ComponentInitializer>> {
        self.initializers.clone()
    }
}

/// Process-wide, lazily populated, ordered view of the located artifacts.
///
/// There is no invalidation: once a kind has been loaded the locator is never
/// consulted for it again.
pub struct OrderedArtifactCache {
    locator: Arc<dyn ArtifactLocator>,
    interceptors: OnceLock<Arc<[Arc<dyn RendererInterceptor>]>>,
    initializers: OnceLock<Arc<[Arc<dyn ComponentInitializer>]>>,
    population_lock: Mutex<()>,
    discoveries: AtomicUsize,
}

impl OrderedArtifactCache {
    /// Create a cache over the given locator. Nothing is discovered yet.
    pub fn new(locator: Arc<dyn ArtifactLocator>) -> Self {
        Self {
            locator,
            interceptors: OnceLock::new(),
            initializers: OnceLock::new(),
            population_lock: Mutex::new(()),
            discoveries: AtomicUsize::new(0),
        }
    }

    /// Renderer interceptors sorted by invocation order.
    pub fn renderer_interceptors(&self) -> Arc<[Arc<dyn RendererInterceptor>]> {
        self.load(
            &self.interceptors,
            || self.locator.renderer_interceptors(),
            |interceptor| interceptor.invocation_order(),
            "renderer_interceptor",
        )
    }

    /// Component initializers sorted by invocation order.
    pub fn component_initializers(&self) -> Arc<[Arc<dyn ComponentInitializer>]> {
        self.load(
            &self.initializers,
            || self.locator.component_initializers(),
            |initializer| initializer.invocation_order(),
            "component_initializer",
        )
    }

    /// Number of times the locator has been consulted.
    pub fn discoveries(&self) -> usize {
        self.discoveries.load(Ordering::Relaxed)
    }

    fn load<T, D, O>(
        &self,
        slot: &OnceLock<Arc<[T]>>,
        discover: D,
        order: O,
        kind: &'static str,
    ) -> Arc<[T]>
    where
        D: FnOnce() -> Vec<T>,
        O: Fn(&T) -> i32,
    {
        if let Some(loaded) = slot.get() {
            return loaded.clone();
        }

        // The lock only guards the discovery; readers never take it once the slot is set.
        let _guard = self
            .population_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(loaded) = slot.get() {
            return loaded.clone();
        }

        let mut artifacts = discover();
        sort_by_invocation_order(&mut artifacts, order);
        self.discoveries.fetch_add(1, Ordering::Relaxed);
        debug!(kind, count = artifacts.len(), "artifacts discovered and ordered");

        slot.get_or_init(|| Arc::from(artifacts)).clone()
    }
}

impl std::fmt::Debug for OrderedArtifactCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedArtifactCache")
            .field("interceptors_loaded", &self.interceptors.get().is_some())
            .field("initializers_loaded", &self.initializers.get().is_some())
            .field("discoveries", &self.discoveries())
            .finish()
    }
}
