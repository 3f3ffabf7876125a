//! Renderer interceptor that feeds property metadata to component initializers

use crate::extractor::MetadataExtractor;
use crate::property::PropertyInformation;
use crate::transform::common_metadata;
use render_hooks::{
    Component, HookResult, InterceptorOutcome, InvocationOrdered, OrderedArtifactCache,
    RendererInterceptor, RequestContext,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Request attribute holding the metadata extracted during this request,
/// keyed by component client id.
pub const EXTRACTED_METADATA_ATTRIBUTE: &str = "field_metadata.extracted";

type ExtractedMetadata = HashMap<String, PropertyInformation>;

/// Extracts the bound property's metadata before a component is encoded and
/// runs the supported initializers with its common form.
///
/// The initializers come from their own [`OrderedArtifactCache`]; it should
/// not be the cache this interceptor is registered in.
pub struct MetadataInterceptor {
    extractor: Arc<MetadataExtractor>,
    initializers: Arc<OrderedArtifactCache>,
}

impl MetadataInterceptor {
    /// Create the interceptor.
    pub fn new(extractor: Arc<MetadataExtractor>, initializers: Arc<OrderedArtifactCache>) -> Self {
        Self {
            extractor,
            initializers,
        }
    }

    /// Metadata extracted for `client_id` earlier in this request.
    pub fn extracted<'a>(ctx: &'a RequestContext, client_id: &str) -> Option<&'a PropertyInformation> {
        ctx.attribute::<ExtractedMetadata>(EXTRACTED_METADATA_ATTRIBUTE)?
            .get(client_id)
    }
}

impl InvocationOrdered for MetadataInterceptor {
    fn invocation_order(&self) -> i32 {
        100
    }
}

impl RendererInterceptor for MetadataInterceptor {
    fn name(&self) -> &str {
        "field_metadata"
    }

    fn before_encode(
        &self,
        ctx: &mut RequestContext,
        component: &mut Component,
    ) -> HookResult<InterceptorOutcome> {
        let Some(info) = self.extractor.extract(ctx, component) else {
            return Ok(InterceptorOutcome::Continue);
        };

        let metadata = common_metadata(&info);
        for initializer in self.initializers.component_initializers().iter() {
            if initializer.is_supported(component) {
                trace!(
                    initializer = %initializer.name(),
                    component = %component.client_id(),
                    "running initializer"
                );
                initializer.configure(ctx, component, &metadata);
            }
        }

        ctx.attribute_or_insert_with::<ExtractedMetadata, _>(EXTRACTED_METADATA_ATTRIBUTE, HashMap::new)
            .insert(component.client_id().to_string(), info);
        Ok(InterceptorOutcome::Continue)
    }
}

impl std::fmt::Debug for MetadataInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataInterceptor")
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, keys};
    use crate::extractor::ExpressionBindingResolver;
    use crate::reflection::ReflectionCache;
    use crate::registry::{TypeDescriptor, TypeRegistry};
    use render_hooks::{ComponentKind, RequiredInitializer, StaticLocator};

    fn interceptor() -> MetadataInterceptor {
        let registry = TypeRegistry::with_builtin_annotations().with_type(
            TypeDescriptor::class("Person").field("name", [Annotation::new(keys::NOT_NULL)]),
        );
        let extractor = MetadataExtractor::new(
            Arc::new(ReflectionCache::new(Arc::new(registry))),
            Arc::new(ExpressionBindingResolver::new().with_bean("person", "Person")),
        );
        let initializers = OrderedArtifactCache::new(Arc::new(
            StaticLocator::new().with_initializer(Arc::new(RequiredInitializer)),
        ));
        MetadataInterceptor::new(Arc::new(extractor), Arc::new(initializers))
    }

    #[test]
    fn test_not_null_property_marks_component_required() {
        let interceptor = interceptor();
        let mut ctx = RequestContext::new();
        let mut component = Component::new("form:name", ComponentKind::InputText)
            .with_value_expression("#{person.name}");

        let outcome = interceptor.before_encode(&mut ctx, &mut component).unwrap();
        assert_eq!(outcome, InterceptorOutcome::Continue);
        assert!(component.is_required());

        let info = MetadataInterceptor::extracted(&ctx, "form:name").unwrap();
        assert!(info.contains(keys::NOT_NULL));
    }

    #[test]
    fn test_unbound_component_is_left_alone() {
        let interceptor = interceptor();
        let mut ctx = RequestContext::new();
        let mut component = Component::new("form:free", ComponentKind::InputText);

        interceptor.before_encode(&mut ctx, &mut component).unwrap();
        assert!(!component.is_required());
        assert!(MetadataInterceptor::extracted(&ctx, "form:free").is_none());
    }
}
