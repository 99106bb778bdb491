use serde::{Deserialize, Serialize};

/// JSON body of the `POST /_session` cookie bootstrap.
#[derive(Debug, Serialize)]
pub struct SessionRequest<'a> {
    pub name: &'a str,
    pub password: &'a str,
}

/// Error payload CouchDB attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ErrorBody {
    /// Builds a readable message out of a failure response body.
    ///
    /// Prefers the standard `{"error": .., "reason": ..}` shape, falls back
    /// to the raw body text, and to `fallback` (the canonical status
    /// reason) when the body is empty.
    pub fn message_from(body: &str, fallback: &str) -> String {
        if body.is_empty() {
            return fallback.to_string();
        }
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                error,
                reason: Some(reason),
            }) => format!("{error}: {reason}"),
            Ok(ErrorBody { error, reason: None }) => error,
            Err(_) => body.to_string(),
        }
    }
}
