use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;
use crate::shared::service_error::ServiceError;

/// Domain interface for face detection.
///
/// Returns boxes without identities, in the order the detector produced
/// them. Implementations run on the service worker thread, hence `Send`.
pub trait FaceDetector: Send {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceBox>, ServiceError>;
}
