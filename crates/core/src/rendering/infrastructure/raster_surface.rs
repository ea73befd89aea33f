use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::rendering::domain::surface::{self, Surface};
use crate::shared::frame::{Frame, PixelRect};

/// Loads a TrueType/OpenType font for label text.
pub fn load_font(path: &Path) -> Result<FontVec, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read font {}: {e}", path.display()))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| format!("Invalid font {}: {e}", path.display()).into())
}

/// Off-screen RGB drawing surface.
///
/// Without a font, label backgrounds are still drawn but text is skipped.
pub struct RasterSurface {
    canvas: RgbImage,
    font: Option<FontVec>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Self {
        Self {
            canvas: RgbImage::new(width.max(1), height.max(1)),
            font,
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    /// Copies the surface out as a frame carrying `index`.
    pub fn to_frame(&self, index: usize) -> Frame {
        Frame::new(
            self.canvas.as_raw().clone(),
            self.canvas.width(),
            self.canvas.height(),
            index,
        )
    }

    /// Clips `rect` to the canvas. `None` when nothing remains.
    fn clip(&self, rect: PixelRect) -> Option<Rect> {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = (rect.x + rect.width).min(self.canvas.width() as i32);
        let y1 = (rect.y + rect.height).min(self.canvas.height() as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32))
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn draw_frame(&mut self, frame: &Frame) {
        let Some(source) = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        else {
            log::warn!(
                "Frame {} has inconsistent dimensions, skipping",
                frame.index()
            );
            return;
        };
        let (width, height) = self.canvas.dimensions();
        self.canvas = if source.dimensions() == (width, height) {
            source
        } else {
            imageops::resize(&source, width, height, imageops::FilterType::Triangle)
        };
    }

    fn stroke_rect(&mut self, rect: PixelRect, line_width: u32, color: surface::Rgb) {
        // imageproc strokes one pixel; thicken by drawing nested rings.
        for inset in 0..line_width.max(1) as i32 {
            let w = rect.width - 2 * inset;
            let h = rect.height - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let ring = Rect::at(rect.x + inset, rect.y + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut self.canvas, ring, Rgb(color));
        }
    }

    fn fill_rect(&mut self, rect: PixelRect, color: surface::Rgb) {
        if let Some(clipped) = self.clip(rect) {
            draw_filled_rect_mut(&mut self.canvas, clipped, Rgb(color));
        }
    }

    fn draw_text(&mut self, x: i32, y: i32, font_size: u32, text: &str, color: surface::Rgb) {
        let Some(font) = &self.font else {
            return;
        };
        draw_text_mut(
            &mut self.canvas,
            Rgb(color),
            x,
            y,
            PxScale::from(font_size as f32),
            font,
            text,
        );
    }
}
