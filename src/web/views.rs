use super::csrf::{csrf_token, validate_csrf};
use super::flash::{self, FlashMessage};
use super::images::{Disposition, png_response};
use super::prelude::*;
use super::session::MemeSession;
use crate::constants::MAX_TOPIC_CHARS;
use crate::models::{ApiKeys, HumorStyle};

pub(crate) mod generate;

/// One entry of the humor style picker.
#[derive(Clone, Debug)]
pub(crate) struct StyleOption {
    pub(crate) value: &'static str,
    pub(crate) label: &'static str,
    pub(crate) description: &'static str,
    pub(crate) selected: bool,
}

impl StyleOption {
    fn all(selected: HumorStyle) -> Vec<Self> {
        HumorStyle::ALL
            .iter()
            .map(|style| StyleOption {
                value: style.as_str(),
                label: style.label(),
                description: style.description(),
                selected: *style == selected,
            })
            .collect()
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "setup.html")]
pub(crate) struct SetupTemplate {
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "create.html")]
pub(crate) struct CreateTemplate {
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
    styles: Vec<StyleOption>,
    topic: String,
    max_topic_chars: usize,
    has_caption: bool,
    setup: String,
    punchline: String,
    has_meme: bool,
    can_regenerate: bool,
}

#[derive(Deserialize)]
pub(crate) struct KeysForm {
    csrf_token: String,
    text_key: String,
    image_key: String,
}

#[derive(Deserialize)]
pub(crate) struct CsrfForm {
    pub(crate) csrf_token: String,
}

async fn flash_fields(session: &Session) -> Result<(bool, String, String), MemeError> {
    Ok(match flash::take_flash_message(session).await? {
        Some(message) => (true, message.text, message.class),
        None => (false, String::new(), String::new()),
    })
}

/// handles the / GET
pub(crate) async fn root_handler(session: Session) -> Result<Response, MemeError> {
    let memes = MemeSession(&session);
    let csrf_token = csrf_token(&session).await?;
    let (has_flash, flash_message, flash_class) = flash_fields(&session).await?;

    if memes.api_keys().await?.is_none() {
        return Ok(SetupTemplate {
            csrf_token,
            has_flash,
            flash_message,
            flash_class,
        }
        .into_response());
    }

    let last_request = memes.last_request().await?;
    let (topic, style) = match &last_request {
        Some(request) => (request.topic().to_string(), request.humor_style()),
        None => (String::new(), HumorStyle::default()),
    };
    let caption = memes.caption().await?;
    let (setup, punchline) = match &caption {
        Some(caption) => (caption.setup.clone(), caption.punchline.clone()),
        None => (String::new(), String::new()),
    };

    Ok(CreateTemplate {
        csrf_token,
        has_flash,
        flash_message,
        flash_class,
        styles: StyleOption::all(style),
        topic,
        max_topic_chars: MAX_TOPIC_CHARS,
        has_caption: caption.is_some(),
        setup,
        punchline,
        has_meme: memes.has_meme().await?,
        can_regenerate: last_request.is_some(),
    }
    .into_response())
}

/// Stores both keys for this session, refusing to store just one.
pub(crate) async fn setup_post(
    session: Session,
    Form(form): Form<KeysForm>,
) -> Result<Redirect, MemeError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let keys = ApiKeys::new(&form.text_key, &form.image_key);
    if !keys.is_complete() {
        flash::set_flash(&session, FlashMessage::warning(flash::KEYS_INCOMPLETE)).await?;
        return Ok(Redirect::to("/"));
    }
    MemeSession(&session).set_api_keys(&keys).await?;
    info!("API keys stored for session");
    flash::set_flash(&session, FlashMessage::success(flash::KEYS_SAVED)).await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn reset_keys_post(
    session: Session,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, MemeError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let memes = MemeSession(&session);
    memes.clear_api_keys().await?;
    memes.set_meme_png(None).await?;
    memes.set_caption(None).await?;
    info!("API keys and meme cleared for session");
    flash::set_flash(&session, FlashMessage::success(flash::KEYS_CLEARED)).await?;
    Ok(Redirect::to("/"))
}

/// GET /meme.png
pub(crate) async fn meme_png_handler(session: Session) -> Result<Response, MemeError> {
    let png = MemeSession(&session)
        .meme_png()
        .await?
        .ok_or_else(|| MemeError::NotFound("meme".to_string()))?;
    png_response(png, Disposition::Inline)
}

/// GET /download
pub(crate) async fn download_handler(session: Session) -> Result<Response, MemeError> {
    let png = MemeSession(&session)
        .meme_png()
        .await?
        .ok_or_else(|| MemeError::NotFound("meme".to_string()))?;
    debug!("sending meme download ({} bytes)", png.len());
    png_response(png, Disposition::Attachment)
}
