use crate::models::{ApiKeys, Caption, GenerationRequest, HumorStyle};
use crate::pipeline::PipelineFailure;
use crate::web::csrf::validate_csrf;
use crate::web::flash::{self, FlashMessage};
use crate::web::prelude::*;
use crate::web::session::MemeSession;

use super::CsrfForm;

#[derive(Deserialize)]
pub(crate) struct GenerateForm {
    csrf_token: String,
    topic: String,
    style: String,
}

enum Job {
    Full(GenerationRequest),
    ImageOnly(GenerationRequest, Caption),
}

/// Runs one pipeline job and stores whatever it left behind in the session.
/// Only one job runs at a time across the server, extra requests bounce.
async fn run_generation(
    state: &AppState,
    session: &Session,
    keys: &ApiKeys,
    job: Job,
) -> Result<Redirect, MemeError> {
    let Ok(_guard) = state.generation_lock.try_lock() else {
        warn!("generation already running, rejecting request");
        flash::set_flash(session, FlashMessage::warning(flash::GENERATION_BUSY)).await?;
        return Ok(Redirect::to("/"));
    };

    let memes = MemeSession(session);
    memes.set_meme_png(None).await?;
    let result = match job {
        Job::Full(request) => {
            memes.set_last_request(&request).await?;
            state.pipeline.generate(keys, &request).await
        }
        Job::ImageOnly(request, caption) => {
            state
                .pipeline
                .regenerate_image(keys, &request, caption)
                .await
        }
    };

    let outcome = result.and_then(|generation| {
        let encoded = generation.meme().encode_png();
        match encoded {
            Ok(png) => Ok((generation, png)),
            Err(error) => Err(PipelineFailure {
                error,
                caption: Some(generation.caption().clone()),
            }),
        }
    });

    match outcome {
        Ok((generation, png)) => {
            info!("meme ready, {} bytes", png.len());
            memes.set_caption(Some(generation.caption())).await?;
            memes.set_meme_png(Some(&png)).await?;
            flash::set_flash(session, FlashMessage::success(flash::MEME_READY)).await?;
        }
        Err(failure) => {
            memes.set_caption(failure.caption.as_ref()).await?;
            flash::set_flash(session, FlashMessage::from_error(&failure.error)).await?;
        }
    }
    Ok(Redirect::to("/"))
}

/// POST /generate
pub(crate) async fn generate_post(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<GenerateForm>,
) -> Result<Redirect, MemeError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let keys = MemeSession(&session).require_api_keys().await?;
    let style: HumorStyle = form.style.parse().map_err(|_| MemeError::BadRequest)?;
    let request = match GenerationRequest::new(&form.topic, style) {
        Ok(request) => request,
        Err(err) => {
            debug!("rejected topic: {}", err);
            flash::set_flash(&session, FlashMessage::from_error(&err)).await?;
            return Ok(Redirect::to("/"));
        }
    };
    run_generation(&state, &session, &keys, Job::Full(request)).await
}

/// POST /regenerate, a fresh caption and image for the last request
pub(crate) async fn regenerate_post(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, MemeError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let memes = MemeSession(&session);
    let keys = memes.require_api_keys().await?;
    let Some(request) = memes.last_request().await? else {
        flash::set_flash(&session, FlashMessage::warning(flash::NOTHING_TO_REGENERATE)).await?;
        return Ok(Redirect::to("/"));
    };
    run_generation(&state, &session, &keys, Job::Full(request)).await
}

/// POST /regenerate/image, keeps the caption
pub(crate) async fn regenerate_image_post(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, MemeError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let memes = MemeSession(&session);
    let keys = memes.require_api_keys().await?;
    let (Some(request), Some(caption)) = (memes.last_request().await?, memes.caption().await?)
    else {
        flash::set_flash(&session, FlashMessage::warning(flash::NOTHING_TO_REGENERATE)).await?;
        return Ok(Redirect::to("/"));
    };
    run_generation(&state, &session, &keys, Job::ImageOnly(request, caption)).await
}

/// POST /new
pub(crate) async fn new_post(
    session: Session,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, MemeError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let memes = MemeSession(&session);
    memes.set_caption(None).await?;
    memes.set_meme_png(None).await?;
    Ok(Redirect::to("/"))
}
