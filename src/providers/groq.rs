//! Caption generation through Groq's OpenAI-compatible chat completions API.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use super::{
    CaptionGenerator, join_endpoint, prompts, require_key, status_error, transport_error,
};
use crate::constants::{CAPTION_MAX_TOKENS, CAPTION_TEMPERATURE};
use crate::error::{GenerationError, Stage};
use crate::models::{ApiKey, Caption, GenerationRequest};

/// Pulls the payload out of a ```json fenced block, if the model added one.
static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").ok());

/// Request body for POST /chat/completions
#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The JSON object the prompt asks for.
#[derive(Deserialize, Debug, Default)]
struct CaptionPayload {
    #[serde(default)]
    top_text: String,
    #[serde(default)]
    bottom_text: String,
    #[serde(default)]
    image_prompt: Option<String>,
}

/// Calls `{base_url}/chat/completions`.
#[derive(Clone, Debug)]
pub struct GroqCaptioner {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
}

impl GroqCaptioner {
    /// `base_url` is the API root, eg `https://api.groq.com/openai/v1/`.
    pub fn new(client: reqwest::Client, base_url: Url, model: &str) -> Self {
        let endpoint = join_endpoint(base_url, "chat/completions");
        Self {
            client,
            endpoint,
            model: model.to_string(),
        }
    }
}

/// Strips code fences and parses the caption JSON.
pub(crate) fn parse_caption(content: &str) -> Result<Caption, GenerationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::EmptyResponse {
            stage: Stage::Caption,
            detail: "the model replied with an empty message".to_string(),
        });
    }
    let json = FENCED_BLOCK
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed);

    let payload: CaptionPayload =
        serde_json::from_str(json).map_err(|err| GenerationError::EmptyResponse {
            stage: Stage::Caption,
            detail: format!("reply was not the requested JSON: {err}"),
        })?;

    let caption = Caption::new(&payload.top_text, &payload.bottom_text)
        .with_image_prompt(payload.image_prompt.as_deref());
    if caption.is_empty() {
        return Err(GenerationError::EmptyResponse {
            stage: Stage::Caption,
            detail: "reply had neither top_text nor bottom_text".to_string(),
        });
    }
    Ok(caption)
}

#[async_trait]
impl CaptionGenerator for GroqCaptioner {
    #[instrument(skip_all, fields(topic = %request.topic(), style = %request.humor_style()))]
    async fn generate_caption(
        &self,
        key: &ApiKey,
        request: &GenerationRequest,
    ) -> Result<Caption, GenerationError> {
        let api_key = require_key(key, Stage::Caption)?;
        let prompt = prompts::caption_prompt(request);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompts::CAPTION_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: CAPTION_TEMPERATURE,
            max_tokens: CAPTION_MAX_TOKENS,
        };

        debug!("POST {} model={}", self.endpoint, self.model);
        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(&err, Stage::Caption))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| transport_error(&err, Stage::Caption))?;
        if !status.is_success() {
            return Err(status_error(status, &bytes, Stage::Caption));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_slice(&bytes).map_err(|err| GenerationError::EmptyResponse {
                stage: Stage::Caption,
                detail: format!("failed to parse chat completion: {err}"),
            })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::EmptyResponse {
                stage: Stage::Caption,
                detail: "no choices in the completion".to_string(),
            })?;

        let caption = parse_caption(&content)?;
        info!("caption ready: {} / {}", caption.setup, caption.punchline);
        Ok(caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let caption = parse_caption(
            r#"{"top_text":"me at 3am","bottom_text":"googling my symptoms","image_prompt":"a man in the glow of a phone"}"#,
        )
        .expect("caption");
        assert_eq!(caption.setup, "ME AT 3AM");
        assert_eq!(caption.punchline, "GOOGLING MY SYMPTOMS");
        assert_eq!(
            caption.image_prompt.as_deref(),
            Some("a man in the glow of a phone")
        );
    }

    #[test]
    fn parses_fenced_json() {
        let reply = "Sure! Here you go:\n```json\n{\"top_text\": \"a\", \"bottom_text\": \"b\"}\n```\nEnjoy";
        let caption = parse_caption(reply).expect("caption");
        assert_eq!((caption.setup.as_str(), caption.punchline.as_str()), ("A", "B"));

        let bare = "```\n{\"top_text\": \"x\", \"bottom_text\": \"\"}\n```";
        let caption = parse_caption(bare).expect("caption");
        assert_eq!(caption.setup, "X");
        assert!(caption.punchline.is_empty());
    }

    #[test]
    fn rejects_empty_and_malformed_replies() {
        for reply in ["", "   ", "lol no", r#"{"top_text":"","bottom_text":""}"#] {
            assert!(
                matches!(
                    parse_caption(reply),
                    Err(GenerationError::EmptyResponse {
                        stage: Stage::Caption,
                        ..
                    })
                ),
                "{reply:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let captioner = GroqCaptioner::new(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9/").expect("url"),
            "test-model",
        );
        let request =
            GenerationRequest::new("anything", crate::models::HumorStyle::Dark).expect("request");
        let err = captioner
            .generate_caption(&ApiKey::default(), &request)
            .await
            .expect_err("should fail");
        assert!(matches!(err, GenerationError::Authentication { .. }));
    }
}
