//! Shared constants/defaults for things
//!

/// Default OpenAI-compatible base URL for Groq chat completions.
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1/";

/// Default base URL for the Stability AI REST API.
pub const DEFAULT_STABILITY_BASE_URL: &str = "https://api.stability.ai/";

/// Text model used for caption generation.
pub const DEFAULT_TEXT_MODEL: &str = "llama-3.3-70b-versatile";

/// Model parameter sent to the SD3 endpoint.
pub const SD3_MODEL: &str = "sd3.5-large";

/// Sampling temperature for captions, deliberately hot.
pub const CAPTION_TEMPERATURE: f32 = 1.1;

/// Token ceiling for a caption reply.
pub const CAPTION_MAX_TOKENS: u32 = 300;

/// Default per-request timeout for provider calls, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Longest topic accepted from a user, in characters.
pub const MAX_TOPIC_CHARS: usize = 200;

/// Filename offered for downloads.
pub const DOWNLOAD_FILENAME_PREFIX: &str = "meme";

/// Cache-Control for meme responses, memes are never cached.
pub const MEME_CACHE_CONTROL: &str = "no-store";

/// Session idle lifetime in minutes.
pub const DEFAULT_SESSION_IDLE_MINUTES: i64 = 60;

/// Length of CSRF session tokens
pub const CSRF_TOKEN_LENGTH: usize = 32;
