//! End-to-end pipeline runs with stubbed providers.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use memesmith::compositor::{Compositor, MemeFont};
use memesmith::error::{GenerationError, Stage};
use memesmith::models::{ApiKey, ApiKeys, Caption, GenerationRequest, HumorStyle, ImageAsset};
use memesmith::pipeline::MemePipeline;
use memesmith::providers::{CaptionGenerator, ImageGenerator};

const VALID_TEXT_KEY: &str = "gsk_valid";

/// Behaves like the caption API: rejects unknown keys, otherwise writes a
/// caption about the topic.
struct ScriptedCaptioner;

#[async_trait]
impl CaptionGenerator for ScriptedCaptioner {
    async fn generate_caption(
        &self,
        key: &ApiKey,
        request: &GenerationRequest,
    ) -> Result<Caption, GenerationError> {
        if key.expose() != VALID_TEXT_KEY {
            return Err(GenerationError::Authentication {
                stage: Stage::Caption,
                message: "Invalid API Key".to_string(),
            });
        }
        Ok(Caption::new(
            &format!("me {}", request.topic()),
            "my calculator asking who I am",
        ))
    }
}

enum ImageBehaviour {
    Picture(u32, u32),
    Fail,
}

struct ScriptedImager {
    behaviour: ImageBehaviour,
    calls: AtomicUsize,
}

impl ScriptedImager {
    fn new(behaviour: ImageBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ImageGenerator for ScriptedImager {
    async fn generate_image(
        &self,
        _key: &ApiKey,
        _request: &GenerationRequest,
        _caption: &Caption,
    ) -> Result<ImageAsset, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            ImageBehaviour::Picture(width, height) => {
                let mut out = Vec::new();
                image::RgbImage::from_fn(width, height, |x, y| {
                    image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
                })
                .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
                .expect("encode png");
                ImageAsset::from_bytes(out)
            }
            ImageBehaviour::Fail => Err(GenerationError::Provider {
                stage: Stage::Image,
                status: 402,
                message: "insufficient credits".to_string(),
            }),
        }
    }
}

fn pipeline(imager: Arc<ScriptedImager>) -> MemePipeline {
    MemePipeline::new(
        Arc::new(ScriptedCaptioner),
        imager,
        Arc::new(Compositor::new(MemeFont::bundled().expect("font"))),
    )
}

fn math_exam() -> GenerationRequest {
    GenerationRequest::new("forgetting my own name during a math exam", HumorStyle::Absurd)
        .expect("request")
}

#[tokio::test]
async fn absurd_math_exam_meme() {
    let imager = ScriptedImager::new(ImageBehaviour::Picture(512, 384));
    let generation = pipeline(imager)
        .generate(&ApiKeys::new(VALID_TEXT_KEY, "sk-image"), &math_exam())
        .await
        .expect("generation");

    assert!(!generation.caption().is_empty());
    assert!(generation.image().width() > 0 && generation.image().height() > 0);
    assert_eq!(
        (generation.meme().width(), generation.meme().height()),
        (generation.image().width(), generation.image().height())
    );
    assert_eq!(generation.request().humor_style(), HumorStyle::Absurd);
}

#[tokio::test]
async fn invalid_text_key_stops_before_the_image() {
    let imager = ScriptedImager::new(ImageBehaviour::Picture(64, 64));
    let failure = pipeline(imager.clone())
        .generate(&ApiKeys::new("gsk_revoked", "sk-image"), &math_exam())
        .await
        .expect_err("should fail");

    assert!(matches!(
        failure.error,
        GenerationError::Authentication {
            stage: Stage::Caption,
            ..
        }
    ));
    assert!(failure.caption.is_none());
    assert_eq!(imager.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn image_error_keeps_caption_for_regenerate_image() {
    let failing = ScriptedImager::new(ImageBehaviour::Fail);
    let keys = ApiKeys::new(VALID_TEXT_KEY, "sk-image");
    let request = math_exam();
    let failure = pipeline(failing)
        .generate(&keys, &request)
        .await
        .expect_err("should fail");

    assert_eq!(failure.stage(), Some(Stage::Image));
    assert_eq!(failure.error.kind(), "provider");
    let caption = failure.caption.expect("caption kept");

    let working = ScriptedImager::new(ImageBehaviour::Picture(300, 300));
    let generation = pipeline(working)
        .regenerate_image(&keys, &request, caption.clone())
        .await
        .expect("regenerated");
    assert_eq!(generation.caption(), &caption);
}

#[tokio::test]
async fn meme_is_written_to_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("nested").join("meme.png");
    let generation = pipeline(ScriptedImager::new(ImageBehaviour::Picture(200, 150)))
        .generate(&ApiKeys::new(VALID_TEXT_KEY, "sk-image"), &math_exam())
        .await
        .expect("generation");

    generation.write_png(&out, false).expect("write");
    let written = image::open(&out).expect("read back");
    assert_eq!((written.width(), written.height()), (200, 150));

    assert!(generation.write_png(&out, false).is_err());
    generation.write_png(&out, true).expect("overwrite");
}
