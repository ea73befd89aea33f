use crate::shared::frame::Frame;

/// Receives every composed overlay frame, in render order.
pub trait FramePresenter: Send {
    fn present(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
