//! Error handling

use std::fmt;

use axum::response::{IntoResponse, Redirect};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which step of the pipeline an error came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Caption (text) generation
    Caption,
    /// Background image generation
    Image,
    /// Drawing the caption onto the picture
    Compositing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Caption => "caption",
            Stage::Image => "image",
            Stage::Compositing => "compositing",
        })
    }
}

/// Everything that can go wrong while producing a meme.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Bad or missing API key
    #[error("{stage} service rejected the API key: {message}")]
    Authentication {
        /// where it happened
        stage: Stage,
        /// provider message, if any
        message: String,
    },
    /// Unreachable host, dropped connection or timeout
    #[error("could not reach the {stage} service: {message}")]
    Network {
        /// where it happened
        stage: Stage,
        /// transport error text
        message: String,
    },
    /// The provider answered but with nothing usable
    #[error("{stage} service returned nothing usable: {detail}")]
    EmptyResponse {
        /// where it happened
        stage: Stage,
        /// what was wrong with it
        detail: String,
    },
    /// The provider answered with some other failure status
    #[error("{stage} service failed with HTTP {status}: {message}")]
    Provider {
        /// where it happened
        stage: Stage,
        /// HTTP status code
        status: u16,
        /// provider message
        message: String,
    },
    /// Image bytes could not be decoded or the meme could not be encoded
    #[error("could not draw the meme: {0}")]
    Compositing(String),
    /// The request itself was unusable
    #[error("{0}")]
    InvalidRequest(String),
}

impl GenerationError {
    /// The stage this error belongs to, when it has one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            GenerationError::Authentication { stage, .. }
            | GenerationError::Network { stage, .. }
            | GenerationError::EmptyResponse { stage, .. }
            | GenerationError::Provider { stage, .. } => Some(*stage),
            GenerationError::Compositing(_) => Some(Stage::Compositing),
            GenerationError::InvalidRequest(_) => None,
        }
    }

    /// Short kind name, handy for logs and CSS classes.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Authentication { .. } => "authentication",
            GenerationError::Network { .. } => "network",
            GenerationError::EmptyResponse { .. } => "empty-response",
            GenerationError::Provider { .. } => "provider",
            GenerationError::Compositing(_) => "compositing",
            GenerationError::InvalidRequest(_) => "invalid-request",
        }
    }

    /// The message shown to the person using the page.
    pub fn user_message(&self) -> String {
        let service = |stage: &Stage| match stage {
            Stage::Caption => "caption (Groq)",
            Stage::Image => "image (Stability AI)",
            Stage::Compositing => "compositing",
        };
        match self {
            GenerationError::Authentication { stage, .. } => format!(
                "The {} API key was rejected. Check the key and try again.",
                service(stage)
            ),
            GenerationError::Network { stage, .. } => format!(
                "Couldn't reach the {} service. Check your connection and hit Regenerate.",
                service(stage)
            ),
            GenerationError::EmptyResponse { stage, .. } => format!(
                "The {} service didn't return anything usable. Hit Regenerate to try again.",
                service(stage)
            ),
            GenerationError::Provider {
                stage,
                status,
                message,
            } => format!("The {} service failed ({status}): {message}", service(stage)),
            GenerationError::Compositing(_) => {
                "The generated image couldn't be turned into a meme. Try regenerating the image."
                    .to_string()
            }
            GenerationError::InvalidRequest(message) => message.clone(),
        }
    }
}

/// definitions for the web application.
#[derive(Debug)]
pub enum MemeError {
    /// When you didn't do the right thing
    BadRequest,
    /// Missing or invalid session / CSRF token
    Unauthorized,
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
    /// Keys haven't been entered yet, send them to setup
    NeedsSetup,
}

impl fmt::Display for MemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemeError::BadRequest => f.write_str("Bad Request"),
            MemeError::Unauthorized => f.write_str("Unauthorized"),
            MemeError::NotFound(what) => write!(f, "Not found: {what}"),
            MemeError::InternalServerError(message) => write!(f, "Internal error: {message}"),
            MemeError::NeedsSetup => f.write_str("API keys required"),
        }
    }
}

impl std::error::Error for MemeError {}

impl From<tower_sessions::session::Error> for MemeError {
    fn from(err: tower_sessions::session::Error) -> Self {
        MemeError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for MemeError {
    fn from(err: axum::http::Error) -> Self {
        MemeError::InternalServerError(err.to_string())
    }
}

impl From<base64::DecodeError> for MemeError {
    fn from(err: base64::DecodeError) -> Self {
        MemeError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for MemeError {
    fn into_response(self) -> axum::response::Response {
        match self {
            MemeError::NeedsSetup => Redirect::to("/").into_response(),
            MemeError::BadRequest => {
                info!("Bad request received");
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Bad Request"));
                *response.status_mut() = axum::http::StatusCode::BAD_REQUEST;
                response
            }
            MemeError::Unauthorized => {
                info!("Unauthorized request received");
                let mut response = axum::response::Response::new(axum::body::Body::from(
                    "Unauthorized: invalid or missing session.",
                ));
                *response.status_mut() = axum::http::StatusCode::UNAUTHORIZED;
                response
            }
            MemeError::NotFound(what) => {
                tracing::debug!("404 {what}");
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Not Found"));
                *response.status_mut() = axum::http::StatusCode::NOT_FOUND;
                response
            }
            MemeError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Internal server error"));
                *response.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_has_a_distinct_message() {
        let errors = [
            GenerationError::Authentication {
                stage: Stage::Caption,
                message: "invalid_api_key".into(),
            },
            GenerationError::Network {
                stage: Stage::Caption,
                message: "timed out".into(),
            },
            GenerationError::EmptyResponse {
                stage: Stage::Caption,
                detail: "no choices".into(),
            },
            GenerationError::Compositing("bad png".into()),
        ];
        let messages: std::collections::HashSet<String> =
            errors.iter().map(GenerationError::user_message).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn user_message_names_the_failing_service() {
        let err = GenerationError::Authentication {
            stage: Stage::Image,
            message: String::new(),
        };
        assert!(err.user_message().contains("Stability"));
        assert_eq!(err.stage(), Some(Stage::Image));
        assert_eq!(err.kind(), "authentication");
        assert_eq!(
            GenerationError::Compositing("x".into()).stage(),
            Some(Stage::Compositing)
        );
    }

    #[test]
    fn needs_setup_redirects_home() {
        let response = MemeError::NeedsSetup.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
    }
}
