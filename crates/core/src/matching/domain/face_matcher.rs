use crate::shared::frame::Frame;
use crate::shared::identity::Identity;
use crate::shared::service_error::ServiceError;

/// Domain interface for identity matching of a single cropped face.
pub trait FaceMatcher: Send {
    fn identify(&self, face: &Frame) -> Result<Identity, ServiceError>;
}
