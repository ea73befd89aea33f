use crate::shared::frame::{Frame, PixelRect};

/// Supplies "the current video frame" of a live stream.
///
/// Capture-device selection and recording belong to the caller; the
/// annotation pipeline only ever asks for whatever frame is current.
pub trait FrameSource: Send {
    fn current_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>>;

    /// The current frame cropped to `rect`, clamped to frame bounds.
    fn current_region(&mut self, rect: PixelRect) -> Result<Frame, Box<dyn std::error::Error>> {
        let frame = self.current_frame()?;
        frame
            .crop(rect)
            .ok_or_else(|| format!("crop {rect:?} lies outside the frame").into())
    }
}
