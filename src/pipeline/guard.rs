//! Guards: pass/fail authorization checks run before a handler.
//!
//! A guard admits (`Ok(true)`), rejects silently (`Ok(false)`, answered with
//! 403 Forbidden), or rejects with a structured error whose status and message
//! reach the client unchanged.

use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::error::PipelineError;
use crate::pipeline::request::RequestContext;

/// Authorization check evaluated at dispatch time.
#[async_trait]
pub trait Guard: Send + Sync {
    async fn can_activate(&self, ctx: &RequestContext) -> Result<bool, PipelineError>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Shared guard handle. Guards live as long as the routers holding them.
pub type SharedGuard = Arc<dyn Guard>;

/// Guard backed by a synchronous closure.
pub struct FnGuard<F> {
    name: &'static str,
    check: F,
}

#[async_trait]
impl<F> Guard for FnGuard<F>
where
    F: Fn(&RequestContext) -> Result<bool, PipelineError> + Send + Sync,
{
    async fn can_activate(&self, ctx: &RequestContext) -> Result<bool, PipelineError> {
        (self.check)(ctx)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Wrap a closure as a shared guard.
pub fn from_fn<F>(name: &'static str, check: F) -> SharedGuard
where
    F: Fn(&RequestContext) -> Result<bool, PipelineError> + Send + Sync + 'static,
{
    Arc::new(FnGuard { name, check })
}

/// Evaluate guards in order. The first rejection stops evaluation.
pub async fn check_guards(guards: &[SharedGuard], ctx: &RequestContext) -> Result<(), PipelineError> {
    for guard in guards {
        match guard.can_activate(ctx).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(guard = guard.name(), route = %ctx.route(), "Guard rejected request");
                return Err(PipelineError::forbidden());
            }
            Err(err) => {
                tracing::debug!(
                    guard = guard.name(),
                    route = %ctx.route(),
                    status = %err.status(),
                    "Guard raised error"
                );
                return Err(err);
            }
        }
    }
    Ok(())
}
