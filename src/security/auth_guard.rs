//! Guard that admits only requests carrying a valid access token.

use async_trait::async_trait;

use crate::pipeline::{Guard, PipelineError, RequestContext};
use crate::security::token::{Claims, TokenService};
use crate::security::TOKEN_SERVICE_KEY;

/// Accepts `Authorization: Bearer <token>` or the access-token cookie.
/// Rejects with an explicit 401 failure.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    cookie_name: String,
}

impl AuthGuard {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    fn token<'a>(&self, ctx: &'a RequestContext) -> Option<&'a str> {
        ctx.bearer_token()
            .or_else(|| ctx.cookie(&self.cookie_name))
            .filter(|t| !t.is_empty())
    }
}

impl Default for AuthGuard {
    fn default() -> Self {
        Self::new("accessToken")
    }
}

#[async_trait]
impl Guard for AuthGuard {
    async fn can_activate(&self, ctx: &RequestContext) -> Result<bool, PipelineError> {
        let Some(token) = self.token(ctx) else {
            tracing::debug!(route = %ctx.route(), "No access token");
            return Err(PipelineError::unauthorized());
        };

        let tokens = ctx.dependencies().require::<dyn TokenService>(TOKEN_SERVICE_KEY)?;
        match tokens.decode(token) {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::debug!(route = %ctx.route(), error = %e, "Access token rejected");
                Err(PipelineError::unauthorized())
            }
        }
    }

    fn name(&self) -> &'static str {
        "AuthGuard"
    }
}

/// Claims of the token presented with `ctx`, if any verifies.
pub fn current_claims(ctx: &RequestContext, cookie_name: &str) -> Option<Claims> {
    let token = ctx.bearer_token().or_else(|| ctx.cookie(cookie_name))?;
    let tokens = ctx.dependencies().get::<dyn TokenService>(TOKEN_SERVICE_KEY)?;
    tokens.decode(token).ok()
}
