use thiserror::Error;

/// Failure of a detection or matching round trip.
///
/// None of these are fatal: the annotation controller absorbs them and
/// moves on to its next step.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to encode image payload: {0}")]
    Encode(#[source] image::ImageError),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("frame unavailable: {0}")]
    FrameUnavailable(String),
    #[error("face service unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Parse(e.to_string())
    }
}
