use serde_json::{Map, Value};

use crate::matching::domain::face_matcher::FaceMatcher;
use crate::shared::constants::MATCH_ENDPOINT;
use crate::shared::frame::Frame;
use crate::shared::identity::Identity;
use crate::shared::service_client::ServiceClient;
use crate::shared::service_error::ServiceError;

/// Identity matcher backed by the remote `/match` endpoint.
pub struct HttpFaceMatcher {
    client: ServiceClient,
}

impl HttpFaceMatcher {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

impl FaceMatcher for HttpFaceMatcher {
    fn identify(&self, face: &Frame) -> Result<Identity, ServiceError> {
        let body = self.client.post_image(MATCH_ENDPOINT, face)?;
        parse_match_response(&body)
    }
}

/// Parses a flat JSON object into an [`Identity`], keeping field order.
///
/// String values are taken as-is; other scalars keep their JSON text.
/// Nested arrays or objects are rejected.
pub fn parse_match_response(body: &str) -> Result<Identity, ServiceError> {
    let object: Map<String, Value> = serde_json::from_str(body)?;
    let mut identity = Identity::new();
    for (key, value) in object {
        let text = match value {
            Value::String(s) => s,
            Value::Array(_) | Value::Object(_) => {
                return Err(ServiceError::Parse(format!(
                    "field {key:?} is not a flat value"
                )))
            }
            scalar => scalar.to_string(),
        };
        identity.insert(key, text);
    }
    Ok(identity)
}
