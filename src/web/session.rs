//! Typed access to what a browser session remembers between requests.

use base64::Engine;
use base64::engine::general_purpose;
use tower_sessions::{Session, session};
use tracing::debug;

use crate::error::MemeError;
use crate::models::{ApiKeys, Caption, GenerationRequest};

const API_KEYS_KEY: &str = "api_keys";
const LAST_REQUEST_KEY: &str = "last_request";
const CAPTION_KEY: &str = "caption";
const MEME_PNG_KEY: &str = "meme_png";

/// Wraps the tower-sessions handle for one request.
pub(crate) struct MemeSession<'a>(pub(crate) &'a Session);

impl MemeSession<'_> {
    /// Stored keys, only when both were given.
    pub(crate) async fn api_keys(&self) -> Result<Option<ApiKeys>, MemeError> {
        Ok(self
            .0
            .get::<ApiKeys>(API_KEYS_KEY)
            .await?
            .filter(ApiKeys::is_complete))
    }

    pub(crate) async fn require_api_keys(&self) -> Result<ApiKeys, MemeError> {
        self.api_keys().await?.ok_or(MemeError::NeedsSetup)
    }

    pub(crate) async fn set_api_keys(&self, keys: &ApiKeys) -> Result<(), MemeError> {
        self.0.insert(API_KEYS_KEY, keys).await?;
        Ok(())
    }

    pub(crate) async fn clear_api_keys(&self) -> Result<(), MemeError> {
        self.0.remove::<ApiKeys>(API_KEYS_KEY).await?;
        Ok(())
    }

    pub(crate) async fn last_request(&self) -> Result<Option<GenerationRequest>, MemeError> {
        match self.0.get::<GenerationRequest>(LAST_REQUEST_KEY).await {
            Ok(request) => Ok(request),
            // A stale value that no longer validates is forgotten, store failures are not.
            Err(session::Error::SerdeJson(err)) => {
                debug!("dropping unreadable last request: {}", err);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn set_last_request(&self, request: &GenerationRequest) -> Result<(), MemeError> {
        self.0.insert(LAST_REQUEST_KEY, request).await?;
        Ok(())
    }

    pub(crate) async fn caption(&self) -> Result<Option<Caption>, MemeError> {
        Ok(self.0.get::<Caption>(CAPTION_KEY).await?)
    }

    pub(crate) async fn set_caption(&self, caption: Option<&Caption>) -> Result<(), MemeError> {
        match caption {
            Some(caption) => {
                self.0.insert(CAPTION_KEY, caption).await?;
            }
            None => {
                self.0.remove::<Caption>(CAPTION_KEY).await?;
            }
        }
        Ok(())
    }

    pub(crate) async fn meme_png(&self) -> Result<Option<Vec<u8>>, MemeError> {
        match self.0.get::<String>(MEME_PNG_KEY).await? {
            Some(encoded) => Ok(Some(general_purpose::STANDARD.decode(encoded)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn has_meme(&self) -> Result<bool, MemeError> {
        Ok(self.0.get::<String>(MEME_PNG_KEY).await?.is_some())
    }

    pub(crate) async fn set_meme_png(&self, png: Option<&[u8]>) -> Result<(), MemeError> {
        match png {
            Some(bytes) => {
                self.0
                    .insert(MEME_PNG_KEY, general_purpose::STANDARD.encode(bytes))
                    .await?;
            }
            None => {
                self.0.remove::<String>(MEME_PNG_KEY).await?;
            }
        }
        Ok(())
    }
}
