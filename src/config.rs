//! Config handling

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::log::LevelFilter;

use crate::cli::ProviderOptions;
use crate::compositor::{Compositor, MemeFont};
use crate::error::GenerationError;
use crate::pipeline::MemePipeline;
use crate::providers::groq::GroqCaptioner;
use crate::providers::stability::StabilityImager;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Which Stability endpoint draws the background.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum ImageEngine {
    /// `stable-image/generate/core`
    #[default]
    Core,
    /// `stable-image/generate/sd3` with the large SD 3.5 model
    Sd3,
}

impl ImageEngine {
    /// Final path segment of the generation endpoint.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ImageEngine::Core => "core",
            ImageEngine::Sd3 => "sd3",
        }
    }
}

impl ProviderOptions {
    /// Shared HTTP client honouring the configured timeout.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    /// Loads the caption font, bundled unless a path was given.
    pub fn font(&self) -> Result<MemeFont, GenerationError> {
        match &self.font_path {
            Some(path) => MemeFont::from_path(path),
            None => MemeFont::bundled(),
        }
    }

    /// Wires the real providers and the compositor into a pipeline.
    pub fn build_pipeline(&self) -> anyhow::Result<MemePipeline> {
        let client = self.http_client().context("Failed to build HTTP client")?;
        let captioner = GroqCaptioner::new(
            client.clone(),
            self.groq_base_url.clone(),
            &self.text_model,
        );
        let imager = StabilityImager::new(client, self.stability_base_url.clone(), self.image_engine);
        let compositor = Compositor::new(self.font().context("Failed to load caption font")?);
        Ok(MemePipeline::new(
            Arc::new(captioner),
            Arc::new(imager),
            Arc::new(compositor),
        ))
    }
}
