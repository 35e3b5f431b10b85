//! Setup wizard status.

use std::sync::Arc;

use axum::body::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{SettingsStore, SETTINGS_KEY};
use crate::pipeline::{parse_json, Envelope, HandlerResult, RequestContext, Router};
use crate::security::AuthGuard;

const IS_READY: &str = "isReady";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadyRequest {
    is_ready: bool,
}

/// `GET /status/wizard`, `POST /status/ready` (guarded).
pub fn router(cookie_name: &str) -> Router {
    let guard = Arc::new(AuthGuard::new(cookie_name));
    Router::build("/status", move |r| {
        r.get("/wizard", wizard);
        r.post_with_body("/ready", set_ready).guard(guard);
    })
}

async fn wizard(ctx: RequestContext) -> HandlerResult {
    let store = ctx.dependencies().require::<dyn SettingsStore>(SETTINGS_KEY)?;
    let ready = store.get(IS_READY).and_then(|v| v.as_bool()).unwrap_or(false);
    Ok(Envelope::boolean(ready))
}

async fn set_ready(ctx: RequestContext, body: Bytes) -> HandlerResult {
    let request: ReadyRequest = parse_json(&body)?;
    let store = ctx.dependencies().require::<dyn SettingsStore>(SETTINGS_KEY)?;
    store.set(IS_READY, Value::Bool(request.is_ready));
    let written = store.commit();
    tracing::info!(is_ready = request.is_ready, written, "Wizard status updated");
    Ok(Envelope::boolean(request.is_ready))
}
