//! Provider clients against throwaway local servers speaking the Groq and
//! Stability AI wire formats.

use std::io::Cursor;

use axum::Router;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use clap::Parser;
use memesmith::cli::CliOptions;
use memesmith::config::ImageEngine;
use memesmith::error::{GenerationError, Stage};
use memesmith::models::{ApiKey, Caption, GenerationRequest, HumorStyle};
use memesmith::providers::groq::GroqCaptioner;
use memesmith::providers::stability::StabilityImager;
use memesmith::providers::{CaptionGenerator, ImageGenerator};
use serde_json::json;
use url::Url;

const GOOD_KEY: &str = "good-key";

async fn spawn(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}/")).expect("url")
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {GOOD_KEY}"))
}

fn request() -> GenerationRequest {
    GenerationRequest::new("forgetting my own name during a math exam", HumorStyle::Absurd)
        .expect("request")
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    image::RgbImage::from_pixel(width, height, image::Rgb([10, 200, 10]))
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .expect("encode png");
    out
}

/// A chat completions server that answers every authorised call with `content`.
async fn groq_server(content: &'static str) -> Url {
    let app = Router::new().route(
        "/openai/v1/chat/completions",
        post(move |headers: HeaderMap, body: String| async move {
            if !authorized(&headers) {
                return (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(json!({"error": {"message": "Invalid API Key", "type": "invalid_request_error"}})),
                )
                    .into_response();
            }
            if !body.contains("llama-3.3-70b-versatile") {
                return StatusCode::BAD_REQUEST.into_response();
            }
            axum::Json(json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
            }))
            .into_response()
        }),
    );
    let base = spawn(app).await;
    base.join("openai/v1/").expect("groq base")
}

fn captioner(base: Url) -> GroqCaptioner {
    GroqCaptioner::new(reqwest::Client::new(), base, "llama-3.3-70b-versatile")
}

#[tokio::test]
async fn groq_caption_from_fenced_json() {
    let base = groq_server(
        "Here you go:\n```json\n{\"top_text\": \"my brain during the exam\", \"bottom_text\": \"error 404 name not found\", \"image_prompt\": \"a student staring at a blank name field\"}\n```",
    )
    .await;
    let caption = captioner(base)
        .generate_caption(&ApiKey::new(GOOD_KEY), &request())
        .await
        .expect("caption");
    assert_eq!(caption.setup, "MY BRAIN DURING THE EXAM");
    assert_eq!(caption.punchline, "ERROR 404 NAME NOT FOUND");
    assert!(caption.image_prompt.is_some());
}

#[tokio::test]
async fn groq_rejects_bad_key_as_authentication() {
    let base = groq_server("{}").await;
    let err = captioner(base)
        .generate_caption(&ApiKey::new("wrong"), &request())
        .await
        .expect_err("should fail");
    match err {
        GenerationError::Authentication { stage, message } => {
            assert_eq!(stage, Stage::Caption);
            assert_eq!(message, "Invalid API Key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn groq_prose_reply_is_empty_response() {
    let base = groq_server("I'd rather not make memes today.").await;
    let err = captioner(base)
        .generate_caption(&ApiKey::new(GOOD_KEY), &request())
        .await
        .expect_err("should fail");
    assert_eq!(err.kind(), "empty-response");
    assert_eq!(err.stage(), Some(Stage::Caption));
}

#[tokio::test]
async fn groq_rate_limit_is_provider_error() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                axum::Json(json!({"error": {"message": "Rate limit reached"}})),
            )
        }),
    );
    let base = spawn(app).await;
    let err = captioner(base)
        .generate_caption(&ApiKey::new(GOOD_KEY), &request())
        .await
        .expect_err("should fail");
    match err {
        GenerationError::Provider {
            stage,
            status,
            message,
        } => {
            assert_eq!(stage, Stage::Caption);
            assert_eq!(status, 429);
            assert!(message.contains("Rate limit"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let base = Url::parse(&format!("http://{addr}/")).expect("url");
    let err = captioner(base)
        .generate_caption(&ApiKey::new(GOOD_KEY), &request())
        .await
        .expect_err("should fail");
    assert_eq!(err.kind(), "network");
}

#[tokio::test]
async fn hanging_provider_times_out_as_network_error() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    );
    let base = spawn(app).await;
    let options =
        CliOptions::parse_from(["memesmith", "--request-timeout", "1"]).providers;
    let client = options.http_client().expect("client");
    let err = GroqCaptioner::new(client, base, "llama-3.3-70b-versatile")
        .generate_caption(&ApiKey::new(GOOD_KEY), &request())
        .await
        .expect_err("should time out");
    match err {
        GenerationError::Network { stage, message } => {
            assert_eq!(stage, Stage::Caption);
            assert_eq!(message, "the request timed out");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// A stable-image server returning `body` with `content_type` to callers that
/// send a proper multipart form and ask for an image.
async fn stability_server(path: &'static str, body: Vec<u8>, content_type: &'static str) -> Url {
    let app = Router::new().route(
        path,
        post(move |headers: HeaderMap, form: String| {
            let body = body.clone();
            async move {
                if !authorized(&headers) {
                    return (
                        StatusCode::UNAUTHORIZED,
                        axum::Json(json!({"name": "unauthorized", "errors": ["authorization: invalid or missing header value"]})),
                    )
                        .into_response();
                }
                let accepts_image = headers
                    .get(ACCEPT)
                    .and_then(|value| value.to_str().ok())
                    .is_some_and(|value| value == "image/*");
                if !accepts_image || !form.contains("name=\"prompt\"") {
                    return StatusCode::BAD_REQUEST.into_response();
                }
                if path.ends_with("sd3") && !form.contains("sd3.5-large") {
                    return StatusCode::BAD_REQUEST.into_response();
                }
                Response::builder()
                    .header(CONTENT_TYPE, content_type)
                    .body(axum::body::Body::from(body))
                    .unwrap_or_default()
            }
        }),
    );
    spawn(app).await
}

fn caption() -> Caption {
    Caption::new("my brain during the exam", "error 404 name not found")
}

#[tokio::test]
async fn stability_returns_the_image() {
    let base = stability_server("/v2beta/stable-image/generate/core", png(64, 48), "image/png").await;
    let imager = StabilityImager::new(reqwest::Client::new(), base, ImageEngine::Core);
    let asset = imager
        .generate_image(&ApiKey::new(GOOD_KEY), &request(), &caption())
        .await
        .expect("image");
    assert_eq!((asset.width(), asset.height()), (64, 48));
    assert_eq!(asset.format(), Some(image::ImageFormat::Png));
}

#[tokio::test]
async fn stability_sd3_sends_the_model() {
    let base = stability_server("/v2beta/stable-image/generate/sd3", png(32, 32), "image/png").await;
    let imager = StabilityImager::new(reqwest::Client::new(), base, ImageEngine::Sd3);
    let asset = imager
        .generate_image(&ApiKey::new(GOOD_KEY), &request(), &caption())
        .await
        .expect("image");
    assert_eq!(asset.width(), 32);
}

#[tokio::test]
async fn stability_bad_key_is_authentication() {
    let base = stability_server("/v2beta/stable-image/generate/core", png(8, 8), "image/png").await;
    let imager = StabilityImager::new(reqwest::Client::new(), base, ImageEngine::Core);
    let err = imager
        .generate_image(&ApiKey::new("nope"), &request(), &caption())
        .await
        .expect_err("should fail");
    assert_eq!(err.kind(), "authentication");
    assert_eq!(err.stage(), Some(Stage::Image));
    assert!(err.to_string().contains("authorization"));
}

#[tokio::test]
async fn stability_non_image_body_is_empty_response() {
    let base = stability_server(
        "/v2beta/stable-image/generate/core",
        b"<html>maintenance</html>".to_vec(),
        "text/html",
    )
    .await;
    let imager = StabilityImager::new(reqwest::Client::new(), base, ImageEngine::Core);
    let err = imager
        .generate_image(&ApiKey::new(GOOD_KEY), &request(), &caption())
        .await
        .expect_err("should fail");
    assert_eq!(err.kind(), "empty-response");
    assert_eq!(err.stage(), Some(Stage::Image));
}
