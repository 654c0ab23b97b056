//! Caption, then image, then compositing.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use tracing::{error, info, instrument, warn};

use crate::compositor::{Compositor, Meme};
use crate::error::{GenerationError, Stage};
use crate::models::{ApiKeys, Caption, GenerationRequest, ImageAsset};
use crate::providers::{CaptionGenerator, ImageGenerator};

/// Everything one successful run produced. The caption and image always
/// belong to `request`, and `meme` was drawn from exactly that pair.
#[derive(Clone, Debug)]
pub struct Generation {
    request: GenerationRequest,
    caption: Caption,
    image: ImageAsset,
    meme: Meme,
}

impl Generation {
    /// What was asked for.
    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// The caption drawn on the meme.
    pub fn caption(&self) -> &Caption {
        &self.caption
    }

    /// The untouched background.
    pub fn image(&self) -> &ImageAsset {
        &self.image
    }

    /// The finished meme.
    pub fn meme(&self) -> &Meme {
        &self.meme
    }

    /// Splits into its parts.
    pub fn into_parts(self) -> (GenerationRequest, Caption, ImageAsset, Meme) {
        (self.request, self.caption, self.image, self.meme)
    }

    /// Saves the meme as a PNG, creating parent directories as needed.
    /// An existing file is only replaced when `overwrite` is set.
    pub fn write_png(&self, path: &Path, overwrite: bool) -> anyhow::Result<()> {
        if path.exists() && !overwrite {
            return Err(anyhow!("Output already exists: {}", path.display()));
        }
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let png = self.meme.encode_png()?;
        fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
        Ok(())
    }
}

/// A run that stopped early. Keeps the caption when the failure came after it.
#[derive(Debug)]
pub struct PipelineFailure {
    /// What went wrong
    pub error: GenerationError,
    /// Caption generated before the failure, if any
    pub caption: Option<Caption>,
}

impl PipelineFailure {
    fn new(error: GenerationError, caption: Option<Caption>) -> Self {
        Self { error, caption }
    }

    /// The stage that failed.
    pub fn stage(&self) -> Option<Stage> {
        self.error.stage()
    }
}

impl std::fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The two providers plus the compositor.
#[derive(Clone)]
pub struct MemePipeline {
    captioner: Arc<dyn CaptionGenerator>,
    imager: Arc<dyn ImageGenerator>,
    compositor: Arc<Compositor>,
}

impl std::fmt::Debug for MemePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemePipeline")
            .field("compositor", &self.compositor)
            .finish_non_exhaustive()
    }
}

impl MemePipeline {
    /// Builds a pipeline from its three stages.
    pub fn new(
        captioner: Arc<dyn CaptionGenerator>,
        imager: Arc<dyn ImageGenerator>,
        compositor: Arc<Compositor>,
    ) -> Self {
        Self {
            captioner,
            imager,
            compositor,
        }
    }

    /// Full run. A caption failure stops before any image call is made.
    #[instrument(skip_all, fields(topic = %request.topic(), style = %request.humor_style()))]
    pub async fn generate(
        &self,
        keys: &ApiKeys,
        request: &GenerationRequest,
    ) -> Result<Generation, PipelineFailure> {
        info!("generating caption");
        let caption = match self.captioner.generate_caption(&keys.text, request).await {
            Ok(caption) => caption,
            Err(err) => {
                warn!("caption failed ({}): {}", err.kind(), err);
                return Err(PipelineFailure::new(err, None));
            }
        };
        self.finish(keys, request, caption).await
    }

    /// Image and compositing only, reusing a caption from an earlier run.
    #[instrument(skip_all, fields(topic = %request.topic()))]
    pub async fn regenerate_image(
        &self,
        keys: &ApiKeys,
        request: &GenerationRequest,
        caption: Caption,
    ) -> Result<Generation, PipelineFailure> {
        self.finish(keys, request, caption).await
    }

    async fn finish(
        &self,
        keys: &ApiKeys,
        request: &GenerationRequest,
        caption: Caption,
    ) -> Result<Generation, PipelineFailure> {
        info!("generating image");
        let image = match self
            .imager
            .generate_image(&keys.image, request, &caption)
            .await
        {
            Ok(image) => image,
            Err(err) => {
                warn!("image failed ({}): {}", err.kind(), err);
                return Err(PipelineFailure::new(err, Some(caption)));
            }
        };

        info!("compositing {}x{}", image.width(), image.height());
        let meme = match self.compositor.composite(&caption, &image) {
            Ok(meme) => meme,
            Err(err) => {
                error!("compositing failed: {}", err);
                return Err(PipelineFailure::new(err, Some(caption)));
            }
        };

        Ok(Generation {
            request: request.clone(),
            caption,
            image,
            meme,
        })
    }
}
