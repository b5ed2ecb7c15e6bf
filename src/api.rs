// Transport module: a small blocking HTTP client that POSTs JSON payloads to
// the Context API and turns responses into JSON objects (or descriptive
// errors).
//
// The API expects the payload as a single form field named `json`, not as a
// raw `application/json` body.

use crate::error::ApiError;
use crate::json::scalar_as_string;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};
use tracing::debug;

/// Sends a payload to a path relative to the API server and yields the
/// validated response object.
///
/// `HttpTransport` is the real implementation; tests substitute scripted
/// transports.
pub trait Transport {
    fn post(&self, path: &str, payload: &Value) -> Result<Map<String, Value>, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, path: &str, payload: &Value) -> Result<Map<String, Value>, ApiError> {
        (**self).post(path, payload)
    }
}

/// User-Agent identifying this build, e.g.
/// `context-api-demo/0.1.0 (build 1a2b3c4/2026-10-15T12:00:00+00:00)`.
pub fn user_agent() -> String {
    format!(
        "{}/{} (build {}/{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_GIT_DESCRIPTION"),
        env!("BUILD_TIMESTAMP"),
    )
}

/// Blocking transport over reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the given API server root. `base_url` must
    /// include the scheme; a trailing slash is ignored.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        // No idle connections are kept, so every request gets its own
        // connection.
        let client = Client::builder()
            .user_agent(user_agent())
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Transport over an already configured client.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn post(&self, path: &str, payload: &Value) -> Result<Map<String, Value>, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let payload_string = serde_json::to_string(payload)?;
        debug!(target: "api_request", "POSTing request to {} with payload json={}", url, payload_string);

        let res = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .form(&[("json", payload_string.as_str())])
            .send()?;

        let status = res.status();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res.text()?;
        debug!(target: "api_request", "{} answered {} ({} bytes)", url, status, body.len());

        validate_response(
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            content_type.as_deref(),
            &body,
        )
    }
}

/// Turns a raw HTTP response into a JSON object.
///
/// Any status other than 200 is an error. The Context API describes its
/// errors in a JSON body, so the body is opportunistically parsed for a
/// hint: the whole body if it carries an `errorCode`, otherwise the
/// `errorMessage` text. A 200 must be `application/json` (parameters such
/// as `charset` are ignored) and must hold a JSON object.
pub fn validate_response(
    code: u16,
    reason: &str,
    content_type: Option<&str>,
    body: &str,
) -> Result<Map<String, Value>, ApiError> {
    if code != 200 {
        return Err(ApiError::Status {
            code,
            reason: reason.to_string(),
            hint: error_hint(body),
        });
    }

    let content_type = content_type.unwrap_or("");
    let parameterless = content_type
        .split(|c| c == ';' || c == ' ')
        .next()
        .unwrap_or("");
    if parameterless != "application/json" {
        return Err(ApiError::ContentType(content_type.to_string()));
    }

    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::NotAnObject),
    }
}

fn error_hint(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let object = json.as_object()?;
    let hint = if object.contains_key("errorCode") {
        json.to_string()
    } else {
        object.get("errorMessage").and_then(scalar_as_string)?
    };
    if hint.is_empty() {
        None
    } else {
        Some(hint)
    }
}
