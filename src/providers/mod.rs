//! The two hosted models the pipeline talks to.
//!
//! Both sit behind a trait so the pipeline and the web handlers can be run
//! against stubs without any network access.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::error::{GenerationError, Stage};
use crate::models::{ApiKey, Caption, GenerationRequest, ImageAsset};

pub mod groq;
pub mod prompts;
pub mod stability;

/// Turns a request into setup/punchline text.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    /// Asks the text model for a caption.
    async fn generate_caption(
        &self,
        key: &ApiKey,
        request: &GenerationRequest,
    ) -> Result<Caption, GenerationError>;
}

/// Turns a request (and its caption) into a background picture.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Asks the image model for a picture.
    async fn generate_image(
        &self,
        key: &ApiKey,
        request: &GenerationRequest,
        caption: &Caption,
    ) -> Result<ImageAsset, GenerationError>;
}

/// Appends `path` to `base`, treating `base` as a directory.
pub(crate) fn join_endpoint(mut base: Url, path: &str) -> Url {
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    match base.join(path) {
        Ok(url) => url,
        Err(_) => base,
    }
}

/// Rejects blank keys before anything goes over the wire.
pub(crate) fn require_key(key: &ApiKey, stage: Stage) -> Result<&str, GenerationError> {
    if key.is_empty() {
        return Err(GenerationError::Authentication {
            stage,
            message: "no API key was provided".to_string(),
        });
    }
    Ok(key.expose())
}

/// Maps transport failures (DNS, refused, timeout, broken body) to `Network`.
pub(crate) fn transport_error(err: &reqwest::Error, stage: Stage) -> GenerationError {
    let message = if err.is_timeout() {
        "the request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    GenerationError::Network { stage, message }
}

/// The error envelopes the two providers use, loosely.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Object {
        #[serde(default)]
        message: Option<String>,
    },
    Text(String),
    #[default]
    Empty,
}

/// Best-effort human-readable message out of an error body.
pub(crate) fn error_message(body: &[u8]) -> String {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let from_json = match parsed.error {
        Some(ErrorDetail::Object {
            message: Some(message),
        }) => Some(message),
        Some(ErrorDetail::Text(message)) => Some(message),
        _ => None,
    }
    .or_else(|| (!parsed.errors.is_empty()).then(|| parsed.errors.join("; ")))
    .or(parsed.message)
    .or(parsed.name);

    let message = from_json.unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
    let mut message: String = message.chars().take(300).collect();
    if message.is_empty() {
        message = "no details given".to_string();
    }
    message
}

/// Classifies a non-success HTTP status.
pub(crate) fn status_error(status: StatusCode, body: &[u8], stage: Stage) -> GenerationError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::Authentication { stage, message }
        }
        _ => GenerationError::Provider {
            stage,
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_join_keeps_the_base_path() {
        let base = Url::parse("https://api.groq.com/openai/v1").expect("url");
        assert_eq!(
            join_endpoint(base, "chat/completions").as_str(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        let base = Url::parse("http://127.0.0.1:9/").expect("url");
        assert_eq!(
            join_endpoint(base, "chat/completions").as_str(),
            "http://127.0.0.1:9/chat/completions"
        );
    }

    #[test]
    fn blank_key_is_an_auth_error() {
        assert!(matches!(
            require_key(&ApiKey::new("  "), Stage::Image),
            Err(GenerationError::Authentication {
                stage: Stage::Image,
                ..
            })
        ));
        assert_eq!(require_key(&ApiKey::new("k"), Stage::Image).ok(), Some("k"));
    }

    #[test]
    fn error_messages_from_both_envelopes() {
        let groq = br#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert_eq!(error_message(groq), "Invalid API Key");

        let stability = br#"{"id":"abc","name":"content_moderation","errors":["Your request was flagged"]}"#;
        assert_eq!(error_message(stability), "Your request was flagged");

        assert_eq!(error_message(b"upstream exploded"), "upstream exploded");
        assert_eq!(error_message(b""), "no details given");
    }

    #[test]
    fn statuses_are_classified() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, b"{}", Stage::Caption),
            GenerationError::Authentication { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, b"{}", Stage::Image),
            GenerationError::Authentication { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, b"slow down", Stage::Image),
            GenerationError::Provider { status: 429, .. }
        ));
    }
}
