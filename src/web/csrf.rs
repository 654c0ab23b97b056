use rand::distr::{Alphanumeric, SampleString};
use tower_sessions::Session;

use crate::constants::CSRF_TOKEN_LENGTH;
use crate::error::MemeError;

const CSRF_TOKEN_KEY: &str = "csrf_token";

fn generate_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), CSRF_TOKEN_LENGTH)
}

/// Returns the session's token, minting one on first use.
pub(crate) async fn csrf_token(session: &Session) -> Result<String, MemeError> {
    if let Some(existing) = session.get::<String>(CSRF_TOKEN_KEY).await? {
        return Ok(existing);
    }
    let token = generate_token();
    session.insert(CSRF_TOKEN_KEY, token.clone()).await?;
    Ok(token)
}

pub(crate) async fn validate_csrf(session: &Session, token: &str) -> Result<(), MemeError> {
    let stored = session.get::<String>(CSRF_TOKEN_KEY).await?;
    match stored {
        Some(expected) if !token.is_empty() && expected == token => Ok(()),
        _ => Err(MemeError::Unauthorized),
    }
}
