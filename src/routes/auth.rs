//! Login, logout and session introspection.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::config::{AuthConfig, AUTH_CONFIG_KEY};
use crate::pipeline::envelope::JSON_CONTENT_TYPE;
use crate::pipeline::{parse_json, Envelope, HandlerResult, PipelineError, RequestContext, Router};
use crate::security::auth_guard::current_claims;
use crate::security::{AuthGuard, TokenService, TOKEN_SERVICE_KEY};

const LOGIN_USER: &str = "admin";

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    access_token: String,
}

/// `POST /auth/login`, `POST /auth/logout`, `GET /auth/me` (guarded).
pub fn router(cookie_name: &str) -> Router {
    let me_cookie = cookie_name.to_string();
    let guard = Arc::new(AuthGuard::new(cookie_name));

    Router::build("/auth", move |r| {
        r.post_with_body("/login", login);
        r.post("/logout", logout);
        r.get("/me", move |ctx| {
            let claims = current_claims(&ctx, &me_cookie);
            async move {
                let claims = claims.ok_or_else(PipelineError::unauthorized)?;
                Envelope::json(&claims)
            }
        })
        .guard(guard);
    })
}

async fn login(ctx: RequestContext, body: Bytes) -> HandlerResult {
    let request: LoginRequest = parse_json(&body)?;
    let password = request.password.trim();
    if password.is_empty() {
        return Err(PipelineError::bad_request("Password is required"));
    }

    let auth = ctx.dependencies().require::<AuthConfig>(AUTH_CONFIG_KEY)?;
    if password != auth.login_password {
        tracing::info!(route = %ctx.route(), "Login rejected");
        return Err(PipelineError::bad_request("Invalid password."));
    }

    let tokens = ctx.dependencies().require::<dyn TokenService>(TOKEN_SERVICE_KEY)?;
    let token = tokens
        .issue(LOGIN_USER)
        .map_err(|e| PipelineError::internal(e.to_string()))?;

    let envelope = Envelope::json(&LoginData {
        access_token: token.clone(),
    })?;
    let cookie = format!("{}={}; HttpOnly; Path=/", auth.cookie_name, token);
    let raw = raw_response(envelope.output(), &cookie)?;

    tracing::info!(user = LOGIN_USER, "Access token granted");
    Ok(envelope.with_raw(raw))
}

async fn logout(ctx: RequestContext) -> HandlerResult {
    let auth = ctx.dependencies().require::<AuthConfig>(AUTH_CONFIG_KEY)?;
    let envelope = Envelope::text("Logged out.");
    let cookie = format!("{}=; HttpOnly; Path=/; Max-Age=0", auth.cookie_name);
    let raw = raw_response(envelope.output(), &cookie)?;
    Ok(envelope.with_raw(raw))
}

fn raw_response(body: String, cookie: &str) -> Result<Response, PipelineError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(header::SET_COOKIE, cookie)
        .body(Body::from(body))
        .map_err(|e| PipelineError::internal(e.to_string()))
}
