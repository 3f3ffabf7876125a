//! Renderer interceptors
//!
//! Interceptors wrap the encoding of a component. The host calls every
//! before-hook in invocation order, renders, then calls every after-hook in the
//! same order. A before-hook may return [`InterceptorOutcome::SkipRemaining`]
//! to stop the before-hooks that follow it; rendering still happens.

use crate::component::Component;
use crate::context::RequestContext;
use crate::error::HookResult;
use crate::order::InvocationOrdered;
use std::sync::Arc;
use tracing::{debug, trace};

/// What the chain should do after a before-hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterceptorOutcome {
    /// Run the next interceptor
    #[default]
    Continue,
    /// Do not run the remaining before-hooks
    SkipRemaining,
}

/// Hook around component encoding.
pub trait RendererInterceptor: InvocationOrdered + Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Called before the component is encoded.
    fn before_encode(
        &self,
        _ctx: &mut RequestContext,
        _component: &mut Component,
    ) -> HookResult<InterceptorOutcome> {
        Ok(InterceptorOutcome::Continue)
    }

    /// Called after the component has been encoded.
    fn after_encode(&self, _ctx: &mut RequestContext, _component: &Component) -> HookResult<()> {
        Ok(())
    }
}

/// Run the before-hooks in order. Returns how many ran.
pub fn run_before_encode(
    interceptors: &[Arc<dyn RendererInterceptor>],
    ctx: &mut RequestContext,
    component: &mut Component,
) -> HookResult<usize> {
    let mut ran = 0;
    for interceptor in interceptors {
        trace!(
            interceptor = %interceptor.name(),
            component = %component.client_id(),
            "before encode"
        );
        let outcome = interceptor.before_encode(ctx, component)?;
        ran += 1;
        if outcome == InterceptorOutcome::SkipRemaining {
            debug!(
                interceptor = %interceptor.name(),
                skipped = interceptors.len() - ran,
                "remaining before-encode interceptors skipped"
            );
            break;
        }
    }
    Ok(ran)
}

/// Run every after-hook in order.
pub fn run_after_encode(
    interceptors: &[Arc<dyn RendererInterceptor>],
    ctx: &mut RequestContext,
    component: &Component,
) -> HookResult<()> {
    for interceptor in interceptors {
        trace!(
            interceptor = %interceptor.name(),
            component = %component.client_id(),
            "after encode"
        );
        interceptor.after_encode(ctx, component)?;
    }
    Ok(())
}
