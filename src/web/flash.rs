use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{GenerationError, MemeError};

const FLASH_KEY: &str = "flash";

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub(crate) struct FlashMessage {
    pub(crate) text: String,
    pub(crate) class: String,
}

impl FlashMessage {
    pub(crate) fn success(text: &str) -> Self {
        Self {
            text: text.to_string(),
            class: "success".to_string(),
        }
    }

    pub(crate) fn warning(text: &str) -> Self {
        Self {
            text: text.to_string(),
            class: "warning".to_string(),
        }
    }

    /// One class per error kind so the page can style them apart.
    pub(crate) fn from_error(err: &GenerationError) -> Self {
        Self {
            text: err.user_message(),
            class: format!("error {}", err.kind()),
        }
    }
}

pub(crate) const KEYS_SAVED: &str = "API keys saved for this session.";
pub(crate) const KEYS_INCOMPLETE: &str = "Enter both API keys to continue.";
pub(crate) const KEYS_CLEARED: &str = "API keys forgotten.";
pub(crate) const MEME_READY: &str = "Done! Your meme is ready.";
pub(crate) const GENERATION_BUSY: &str =
    "A meme is already being generated. Wait for it to finish, then try again.";
pub(crate) const NOTHING_TO_REGENERATE: &str = "Generate a meme first.";

pub(crate) async fn set_flash(session: &Session, message: FlashMessage) -> Result<(), MemeError> {
    session.insert(FLASH_KEY, message).await?;
    Ok(())
}

pub(crate) async fn take_flash_message(
    session: &Session,
) -> Result<Option<FlashMessage>, MemeError> {
    Ok(session.remove::<FlashMessage>(FLASH_KEY).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;

    #[test]
    fn error_flash_carries_the_kind() {
        let flash = FlashMessage::from_error(&GenerationError::Network {
            stage: Stage::Image,
            message: "timeout".into(),
        });
        assert_eq!(flash.class, "error network");
        assert!(flash.text.contains("Stability"));
    }
}
