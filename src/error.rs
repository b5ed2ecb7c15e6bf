// Errors raised by the transport and query layers.
//
// The binary and the poll loop wrap these in `anyhow::Error`; the typed
// variants exist so callers (and tests) can tell a bad status apart from a
// content-type mismatch or a failed single-entity lookup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with something other than 200.
    #[error("Server responded with {}{}", status_line(.code, .reason), format_hint(.hint))]
    Status {
        code: u16,
        reason: String,
        hint: Option<String>,
    },

    #[error("Received content type '{0}' instead of 'application/json'")]
    ContentType(String),

    #[error("Response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Response JSON is not an object")]
    NotAnObject,

    #[error("Response has no '{0}' array")]
    MissingArray(&'static str),

    #[error("Querying {entity_id} did not yield exactly 1 result (got {count})")]
    EntityLookup { entity_id: String, count: usize },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

fn status_line(code: &u16, reason: &str) -> String {
    if reason.is_empty() {
        code.to_string()
    } else {
        format!("{} {}", code, reason)
    }
}

fn format_hint(hint: &Option<String>) -> String {
    match hint {
        Some(h) if !h.is_empty() => format!(". ({})", h),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, reason: &str, hint: Option<&str>) -> String {
        ApiError::Status {
            code,
            reason: reason.to_string(),
            hint: hint.map(str::to_string),
        }
        .to_string()
    }

    #[test]
    fn status_without_reason_has_no_trailing_space() {
        assert_eq!(status(599, "", None), "Server responded with 599");
        assert_eq!(status(599, "", Some("bar")), "Server responded with 599. (bar)");
        assert_eq!(status(404, "Not Found", None), "Server responded with 404 Not Found");
    }
}
