//! Request, caption and image types that flow through the pipeline.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_TOPIC_CHARS;
use crate::error::{GenerationError, Stage};

/// Tone preset steering the caption and image prompts.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HumorStyle {
    /// Savage, ironic, mocking.
    #[default]
    Sarcastic,
    /// Hyperspecific shared experiences.
    Relatable,
    /// Surreal, nonsensical.
    Absurd,
    /// Kind twist on a struggle.
    Wholesome,
    /// Existential, self-deprecating.
    Dark,
}

impl HumorStyle {
    /// Every style, in the order the UI lists them.
    pub const ALL: [HumorStyle; 5] = [
        HumorStyle::Sarcastic,
        HumorStyle::Relatable,
        HumorStyle::Absurd,
        HumorStyle::Wholesome,
        HumorStyle::Dark,
    ];

    /// Lowercase identifier used in forms and sessions.
    pub fn as_str(&self) -> &'static str {
        match self {
            HumorStyle::Sarcastic => "sarcastic",
            HumorStyle::Relatable => "relatable",
            HumorStyle::Absurd => "absurd",
            HumorStyle::Wholesome => "wholesome",
            HumorStyle::Dark => "dark",
        }
    }

    /// Capitalised name for display.
    pub fn label(&self) -> &'static str {
        match self {
            HumorStyle::Sarcastic => "Sarcastic",
            HumorStyle::Relatable => "Relatable",
            HumorStyle::Absurd => "Absurd",
            HumorStyle::Wholesome => "Wholesome",
            HumorStyle::Dark => "Dark",
        }
    }

    /// One-line description shown next to the style picker.
    pub fn description(&self) -> &'static str {
        match self {
            HumorStyle::Sarcastic => "Savage, ironic, and mocking. Makes fun of the situation.",
            HumorStyle::Relatable => "Universal experiences everyone has. 'OMG that's so me!'",
            HumorStyle::Absurd => "Random, nonsensical, surreal humor. Completely unexpected.",
            HumorStyle::Wholesome => "Positive twist, heartwarming, subverts with kindness.",
            HumorStyle::Dark => {
                "Dark humor, existential comedy, self-deprecating about struggles."
            }
        }
    }
}

impl fmt::Display for HumorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HumorStyle {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        HumorStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GenerationError::InvalidRequest(format!("Unknown humor style: {wanted}")))
    }
}

/// What the user asked for. Immutable once built.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRequest")]
pub struct GenerationRequest {
    topic: String,
    humor_style: HumorStyle,
}

#[derive(Deserialize)]
struct RawRequest {
    topic: String,
    humor_style: HumorStyle,
}

impl TryFrom<RawRequest> for GenerationRequest {
    type Error = GenerationError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        GenerationRequest::new(&raw.topic, raw.humor_style)
    }
}

impl GenerationRequest {
    /// Validates and trims the topic.
    pub fn new(topic: &str, humor_style: HumorStyle) -> Result<Self, GenerationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "Please enter a topic first!".to_string(),
            ));
        }
        if topic.chars().count() > MAX_TOPIC_CHARS {
            return Err(GenerationError::InvalidRequest(format!(
                "Topics are limited to {MAX_TOPIC_CHARS} characters"
            )));
        }
        Ok(Self {
            topic: topic.to_string(),
            humor_style,
        })
    }

    /// The trimmed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The chosen tone.
    pub fn humor_style(&self) -> HumorStyle {
        self.humor_style
    }
}

/// Two-part meme text plus the model's idea for the picture.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// Top text.
    pub setup: String,
    /// Bottom text, may be empty.
    pub punchline: String,
    /// Reaction image description suggested alongside the text.
    #[serde(default)]
    pub image_prompt: Option<String>,
}

impl Caption {
    /// Builds a caption, upper-casing both lines the way memes are written.
    ///
    /// An empty setup with a punchline promotes the punchline so the top
    /// band is never the empty one.
    pub fn new(setup: &str, punchline: &str) -> Self {
        let setup = setup.trim().to_uppercase();
        let punchline = punchline.trim().to_uppercase();
        let (setup, punchline) = if setup.is_empty() {
            (punchline, String::new())
        } else {
            (setup, punchline)
        };
        Self {
            setup,
            punchline,
            image_prompt: None,
        }
    }

    /// Attaches the suggested picture description, ignoring blank ones.
    pub fn with_image_prompt(mut self, prompt: Option<&str>) -> Self {
        self.image_prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        self
    }

    /// True when there's nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.setup.is_empty() && self.punchline.is_empty()
    }
}

/// Raw bytes from the image provider, with their decoded dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    format: Option<image::ImageFormat>,
}

impl ImageAsset {
    /// Reads the header to learn the format and size. The pixels are decoded
    /// later by the compositor.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, GenerationError> {
        let reader = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|err| GenerationError::Compositing(err.to_string()))?;
        let format = reader.format();
        let (width, height) = reader
            .into_dimensions()
            .map_err(|err| GenerationError::Compositing(err.to_string()))?;
        if width == 0 || height == 0 {
            return Err(GenerationError::Compositing(format!(
                "Image has no pixels ({width}x{height})"
            )));
        }
        Ok(Self {
            bytes,
            width,
            height,
            format,
        })
    }

    /// Like [`ImageAsset::from_bytes`], but blames the provider that sent the bytes.
    pub(crate) fn from_provider_bytes(bytes: Vec<u8>, stage: Stage) -> Result<Self, GenerationError> {
        Self::from_bytes(bytes).map_err(|err| GenerationError::EmptyResponse {
            stage,
            detail: format!("response was not a usable image: {err}"),
        })
    }

    /// Encoded image bytes as received.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Detected container format, if recognised.
    pub fn format(&self) -> Option<image::ImageFormat> {
        self.format
    }
}

/// A user-supplied provider key. Never printed.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key, trimming whitespace picked up from copy and paste.
    pub fn new(key: &str) -> Self {
        Self(key.trim().to_string())
    }

    /// The secret itself, for the Authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when nothing was entered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("ApiKey(<empty>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

/// Both provider keys, held for the lifetime of a session.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Key for the caption (text) provider.
    pub text: ApiKey,
    /// Key for the image provider.
    pub image: ApiKey,
}

impl ApiKeys {
    /// Builds the pair from raw form input.
    pub fn new(text: &str, image: &str) -> Self {
        Self {
            text: ApiKey::new(text),
            image: ApiKey::new(image),
        }
    }

    /// Both keys were supplied.
    pub fn is_complete(&self) -> bool {
        !self.text.is_empty() && !self.image.is_empty()
    }
}
