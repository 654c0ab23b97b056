//! Background images from Stability AI's stable-image endpoints.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::Form;
use tracing::{debug, info, instrument};
use url::Url;

use super::{ImageGenerator, join_endpoint, prompts, require_key, status_error, transport_error};
use crate::config::ImageEngine;
use crate::constants::SD3_MODEL;
use crate::error::{GenerationError, Stage};
use crate::models::{ApiKey, Caption, GenerationRequest, ImageAsset};

/// Calls `{base_url}/v2beta/stable-image/generate/{engine}`.
#[derive(Clone, Debug)]
pub struct StabilityImager {
    client: reqwest::Client,
    endpoint: Url,
    engine: ImageEngine,
}

impl StabilityImager {
    /// `base_url` is the API root, eg `https://api.stability.ai/`.
    pub fn new(client: reqwest::Client, base_url: Url, engine: ImageEngine) -> Self {
        let endpoint = join_endpoint(
            base_url,
            &format!("v2beta/stable-image/generate/{}", engine.path_segment()),
        );
        Self {
            client,
            endpoint,
            engine,
        }
    }

    fn form(&self, prompt: String) -> Form {
        let form = Form::new()
            .text("prompt", prompt)
            .text("output_format", "png")
            .text("aspect_ratio", "1:1")
            .text("negative_prompt", prompts::IMAGE_NEGATIVE_PROMPT);
        match self.engine {
            ImageEngine::Core => form,
            ImageEngine::Sd3 => form.text("model", SD3_MODEL),
        }
    }
}

#[async_trait]
impl ImageGenerator for StabilityImager {
    #[instrument(skip_all, fields(topic = %request.topic(), engine = ?self.engine))]
    async fn generate_image(
        &self,
        key: &ApiKey,
        request: &GenerationRequest,
        caption: &Caption,
    ) -> Result<ImageAsset, GenerationError> {
        let api_key = require_key(key, Stage::Image)?;
        let prompt = prompts::image_prompt(request, caption);
        debug!("POST {} prompt={:?}", self.endpoint, prompts::scene_for(request, caption));

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .header(ACCEPT, "image/*")
            .multipart(self.form(prompt))
            .send()
            .await
            .map_err(|err| transport_error(&err, Stage::Image))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| transport_error(&err, Stage::Image))?;
        if !status.is_success() {
            return Err(status_error(status, &bytes, Stage::Image));
        }
        if bytes.is_empty() {
            return Err(GenerationError::EmptyResponse {
                stage: Stage::Image,
                detail: "empty image body".to_string(),
            });
        }

        let asset = ImageAsset::from_provider_bytes(bytes.to_vec(), Stage::Image)?;
        info!("image ready: {}x{}", asset.width(), asset.height());
        Ok(asset)
    }
}
