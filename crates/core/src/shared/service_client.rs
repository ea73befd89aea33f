use std::time::Duration;

use crate::shared::constants::PAYLOAD_CONTENT_TYPE;
use crate::shared::frame::Frame;
use crate::shared::image_payload::encode_png_base64;
use crate::shared::service_error::ServiceError;

/// Blocking HTTP client for the detection/matching service.
///
/// Both endpoints take the same request shape (a base64 PNG body) and
/// differ only in path and response schema.
#[derive(Clone, Debug)]
pub struct ServiceClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport {
                url: base_url.clone(),
                source: e,
            })?;
        Ok(Self { http, base_url })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    /// POSTs `frame` to `endpoint` and returns the response body.
    pub fn post_image(&self, endpoint: &str, frame: &Frame) -> Result<String, ServiceError> {
        let url = self.endpoint_url(endpoint);
        let payload = encode_png_base64(frame)?;

        log::debug!(
            "POST {url} ({}x{} frame #{}, {} byte payload)",
            frame.width(),
            frame.height(),
            frame.index(),
            payload.len()
        );

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, PAYLOAD_CONTENT_TYPE)
            .body(payload)
            .send()
            .map_err(|e| ServiceError::Transport {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .map_err(|e| ServiceError::Transport { url, source: e })
    }
}
