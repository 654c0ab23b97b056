use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::Response;
use chrono::Utc;

use crate::constants::{DOWNLOAD_FILENAME_PREFIX, MEME_CACHE_CONTROL};
use crate::error::MemeError;

/// How the browser should treat the meme bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Disposition {
    /// Shown in the page
    Inline,
    /// Saved as a file
    Attachment,
}

/// Timestamped download name, eg `meme-20261019-134501.png`.
pub(crate) fn download_filename() -> String {
    format!(
        "{}-{}.png",
        DOWNLOAD_FILENAME_PREFIX,
        Utc::now().format("%Y%m%d-%H%M%S")
    )
}

/// Builds a PNG response that is never cached.
pub(crate) fn png_response(bytes: Vec<u8>, disposition: Disposition) -> Result<Response, MemeError> {
    let mut builder = Response::builder()
        .header(CONTENT_TYPE, "image/png")
        .header(CACHE_CONTROL, MEME_CACHE_CONTROL);
    if disposition == Disposition::Attachment {
        builder = builder.header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_filename()),
        );
    }
    builder.body(Body::from(bytes)).map_err(MemeError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_sets_disposition_and_no_store() {
        let response = png_response(vec![1, 2, 3], Disposition::Attachment).expect("response");
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(disposition.starts_with("attachment; filename=\"meme-"));
        assert!(disposition.ends_with(".png\""));
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "image/png");
    }

    #[test]
    fn inline_has_no_disposition() {
        let response = png_response(vec![1], Disposition::Inline).expect("response");
        assert!(response.headers().get(CONTENT_DISPOSITION).is_none());
    }
}
