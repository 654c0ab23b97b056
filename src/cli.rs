//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::config::ImageEngine;
use crate::constants::{
    DEFAULT_GROQ_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SESSION_IDLE_MINUTES,
    DEFAULT_STABILITY_BASE_URL, DEFAULT_TEXT_MODEL,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "MEMESMITH_DEBUG")]
    /// Enable debug logging. Env: MEMESMITH_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "MEMESMITH_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: MEMESMITH_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "MEMESMITH_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: MEMESMITH_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(flatten)]
    /// Where and how the providers are called.
    pub providers: ProviderOptions,

    #[clap(
        long,
        default_value_t = DEFAULT_SESSION_IDLE_MINUTES,
        value_parser = clap::value_parser!(i64).range(1..),
        env = "MEMESMITH_SESSION_IDLE_MINUTES"
    )]
    /// Minutes of inactivity before a session (and its keys) is dropped.
    /// Env: MEMESMITH_SESSION_IDLE_MINUTES
    pub session_idle_minutes: i64,
}

/// Provider settings shared by the server and the one-shot generator.
#[derive(clap::Args, Debug, Clone)]
pub struct ProviderOptions {
    #[clap(long, default_value = DEFAULT_GROQ_BASE_URL, env = "MEMESMITH_GROQ_BASE_URL")]
    /// Base URL of the OpenAI-compatible chat completions API.
    pub groq_base_url: url::Url,

    #[clap(long, default_value = DEFAULT_STABILITY_BASE_URL, env = "MEMESMITH_STABILITY_BASE_URL")]
    /// Base URL of the Stability AI API.
    pub stability_base_url: url::Url,

    #[clap(long, default_value = DEFAULT_TEXT_MODEL, env = "MEMESMITH_TEXT_MODEL")]
    /// Text model used for captions.
    pub text_model: String,

    #[clap(long, value_enum, default_value = "core", env = "MEMESMITH_IMAGE_ENGINE")]
    /// Stability image engine.
    pub image_engine: ImageEngine,

    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "MEMESMITH_REQUEST_TIMEOUT")]
    /// Per-request timeout for provider calls, in seconds.
    pub request_timeout: u64,

    #[clap(long, env = "MEMESMITH_FONT_PATH")]
    /// TTF/OTF font to draw captions with, the bundled DejaVu Sans Bold otherwise.
    pub font_path: Option<PathBuf>,
}
