//! Unified response envelope.
//!
//! # Wire Format
//! ```text
//! success: { "ok": true,  "data": <text|bool|object> }
//! error:   { "ok": false, "error": "<message>" }
//! ```
//!
//! A success may carry a prebuilt raw response (e.g. one that sets cookies).
//! The raw response is sent verbatim and the envelope body is skipped.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::pipeline::error::PipelineError;

/// The content type of every serialized envelope.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Serialized shape; field order puts `ok` first.
#[derive(Serialize)]
struct Wire<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Success payload variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Bool(bool),
    Data(Value),
}

/// Tagged handler outcome serialized by the dispatcher.
#[derive(Debug)]
pub enum Envelope {
    Success {
        payload: Payload,
        raw: Option<Response>,
    },
    Failure {
        status: StatusCode,
        message: String,
    },
}

impl Envelope {
    pub fn text(text: impl Into<String>) -> Self {
        Self::success(Payload::Text(text.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::success(Payload::Bool(value))
    }

    pub fn data(value: Value) -> Self {
        Self::success(Payload::Data(value))
    }

    /// Serialize any value as structured data.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, PipelineError> {
        serde_json::to_value(value)
            .map(Self::data)
            .map_err(|e| PipelineError::internal(e.to_string()))
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Failure {
            status,
            message: message.into(),
        }
    }

    fn success(payload: Payload) -> Self {
        Self::Success { payload, raw: None }
    }

    /// Attach a prebuilt response that replaces envelope serialization.
    /// Has no effect on a failure.
    pub fn with_raw(self, response: Response) -> Self {
        match self {
            Self::Success { payload, .. } => Self::Success {
                payload,
                raw: Some(response),
            },
            failure => failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    /// Status the client will observe.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success { raw: Some(raw), .. } => raw.status(),
            Self::Success { raw: None, .. } => StatusCode::OK,
            Self::Failure { status, .. } => *status,
        }
    }

    /// Canonical wire string. Ignores any attached raw response.
    pub fn output(&self) -> String {
        let wire = match self {
            Self::Success { payload, .. } => Wire {
                ok: true,
                data: Some(payload),
                error: None,
            },
            Self::Failure { message, .. } => Wire {
                ok: false,
                data: None,
                error: Some(message),
            },
        };
        serde_json::to_string(&wire)
            .unwrap_or_else(|_| r#"{"ok":false,"error":"Unknown error"}"#.to_string())
    }
}

impl From<&str> for Envelope {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Envelope {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<bool> for Envelope {
    fn from(value: bool) -> Self {
        Self::boolean(value)
    }
}

impl From<Value> for Envelope {
    fn from(value: Value) -> Self {
        Self::data(value)
    }
}

impl From<PipelineError> for Envelope {
    fn from(err: PipelineError) -> Self {
        err.into_envelope()
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        if let Self::Success { raw: Some(raw), .. } = self {
            return raw;
        }
        let status = self.status();
        let mut response = (status, self.output()).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_output() {
        assert_eq!(Envelope::text("v1").output(), r#"{"ok":true,"data":"v1"}"#);
    }

    #[test]
    fn test_bool_and_data_output() {
        let v: Value = serde_json::from_str(&Envelope::boolean(false).output()).unwrap();
        assert_eq!(v, json!({ "ok": true, "data": false }));

        let v: Value =
            serde_json::from_str(&Envelope::data(json!({ "ip": "10.0.0.2" })).output()).unwrap();
        assert_eq!(v, json!({ "ok": true, "data": { "ip": "10.0.0.2" } }));
    }

    #[test]
    fn test_failure_output() {
        let env = Envelope::failure(StatusCode::UNAUTHORIZED, "Unauthorized");
        assert_eq!(env.status(), StatusCode::UNAUTHORIZED);
        let v: Value = serde_json::from_str(&env.output()).unwrap();
        assert_eq!(v, json!({ "ok": false, "error": "Unauthorized" }));
    }

    #[test]
    fn test_raw_response_is_sent_verbatim() {
        let raw = (StatusCode::CREATED, "custom").into_response();
        let env = Envelope::text("ignored").with_raw(raw);
        assert_eq!(env.status(), StatusCode::CREATED);
        let response = env.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_ne!(
            response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(JSON_CONTENT_TYPE.as_bytes())
        );
    }

    #[test]
    fn test_with_raw_keeps_failure() {
        let env = Envelope::failure(StatusCode::BAD_REQUEST, "bad")
            .with_raw(StatusCode::OK.into_response());
        assert!(!env.is_success());
        assert_eq!(env.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_json_serializes_struct() {
        #[derive(Serialize)]
        struct Info {
            version: &'static str,
        }
        let env = Envelope::json(&Info { version: "1.0" }).unwrap();
        assert_eq!(env.payload(), Some(&Payload::Data(json!({ "version": "1.0" }))));
    }
}
