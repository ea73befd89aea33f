use crate::shared::face_box::FaceBox;

/// Annotation data shared between the controller and the renderer.
///
/// Single writer: only [`AnnotationController`] mutates it, and only by
/// replacing whole boxes or the whole list. The renderer reads it between
/// controller steps, so it never sees a partially written box.
///
/// [`AnnotationController`]: super::annotation_controller::AnnotationController
#[derive(Debug, Default)]
pub struct AnnotationState {
    pub(crate) active: bool,
    pub(crate) boxes: Vec<FaceBox>,
}

impl AnnotationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn boxes(&self) -> &[FaceBox] {
        &self.boxes
    }

    pub fn identified_count(&self) -> usize {
        self.boxes.iter().filter(|b| b.has_identity()).count()
    }
}
