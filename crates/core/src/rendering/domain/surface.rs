use crate::shared::frame::{Frame, PixelRect};

pub type Rgb = [u8; 3];

/// Drawing target for the overlay renderer.
///
/// Coordinates are surface pixels. Shapes that fall partly outside the
/// surface are clipped, never rejected.
pub trait Surface {
    fn size(&self) -> (u32, u32);

    /// Draws `frame` stretched to cover the whole surface.
    fn draw_frame(&mut self, frame: &Frame);

    /// Outlines `rect` with a stroke `line_width` pixels thick, drawn inward.
    fn stroke_rect(&mut self, rect: PixelRect, line_width: u32, color: Rgb);

    fn fill_rect(&mut self, rect: PixelRect, color: Rgb);

    /// Draws one line of text with its top-left corner at `(x, y)`.
    fn draw_text(&mut self, x: i32, y: i32, font_size: u32, text: &str, color: Rgb);
}
