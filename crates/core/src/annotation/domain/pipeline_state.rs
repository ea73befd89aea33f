use crate::shared::face_box::FaceBox;
use crate::shared::frame::PixelRect;
use crate::shared::identity::Identity;
use crate::shared::service_error::ServiceError;

/// Where the detect/match cycle currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    AwaitingDetection,
    /// `match_index` is the next box, scanning from the highest index down,
    /// that still lacks an identity.
    AwaitingMatch { match_index: usize },
}

/// Identifies one issued request so its completion can be paired with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTicket(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Detect faces in the full current frame.
    Detect,
    /// Identify `boxes[index]` from the current frame cropped to `crop`.
    Match { index: usize, crop: PixelRect },
}

/// A request the controller wants issued. It is in flight from the moment
/// [`AnnotationController::poll`] hands it out.
///
/// [`AnnotationController::poll`]: super::annotation_controller::AnnotationController::poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    pub kind: RequestKind,
}

#[derive(Debug)]
pub enum Outcome {
    Detected(Result<Vec<FaceBox>, ServiceError>),
    Matched(Result<Identity, ServiceError>),
}

/// Result of a request, delivered back to the controller.
#[derive(Debug)]
pub struct Completion {
    pub ticket: RequestTicket,
    pub outcome: Outcome,
}

impl Outcome {
    /// The failed outcome matching a request of `kind`.
    pub fn failure(kind: RequestKind, error: ServiceError) -> Self {
        match kind {
            RequestKind::Detect => Outcome::Detected(Err(error)),
            RequestKind::Match { .. } => Outcome::Matched(Err(error)),
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            Outcome::Detected(r) => r.is_ok(),
            Outcome::Matched(r) => r.is_ok(),
        }
    }
}
