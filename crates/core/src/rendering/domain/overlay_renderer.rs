use crate::annotation::domain::annotation_state::AnnotationState;
use crate::rendering::domain::surface::{Rgb, Surface};
use crate::rendering::domain::text_box_layout::{Emphasis, LabelRect, TextBoxLayout};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::{Frame, PixelRect};
use crate::shared::overlay_config::OverlayStyle;

const BLACK: Rgb = [0, 0, 0];
const WHITE: Rgb = [255, 255, 255];

/// What one render pass put on the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub outlines: usize,
    pub labels: usize,
}

/// Draws the current frame plus whatever annotations are currently known.
///
/// Read-only with respect to [`AnnotationState`]. Box edges are mapped from
/// frame to surface coordinates; label metrics are in surface pixels.
pub struct OverlayRenderer {
    layout: TextBoxLayout,
    box_color: Rgb,
    line_width: u32,
}

impl OverlayRenderer {
    pub fn new(style: &OverlayStyle) -> Self {
        Self {
            layout: TextBoxLayout::new(style),
            box_color: style.box_color,
            line_width: style.box_line_width,
        }
    }

    pub fn render(
        &self,
        frame: &Frame,
        state: &AnnotationState,
        surface: &mut dyn Surface,
    ) -> RenderSummary {
        surface.draw_frame(frame);

        let mut summary = RenderSummary::default();
        if !state.is_active() || state.boxes().is_empty() {
            return summary;
        }

        let (sx, sy) = scale_factors(frame, surface.size());

        let visible: Vec<FaceBox> = state
            .boxes()
            .iter()
            .filter(|b| !b.is_degenerate())
            .map(|b| b.scaled(sx, sy))
            .collect();

        for face in &visible {
            surface.stroke_rect(face.crop_rect(), self.line_width, self.box_color);
            summary.outlines += 1;
        }

        for face in visible.iter().filter(|b| b.has_identity()) {
            for label in self.layout.layout(face).labels {
                self.draw_label(surface, &label);
                summary.labels += 1;
            }
        }

        summary
    }

    fn draw_label(&self, surface: &mut dyn Surface, label: &LabelRect) {
        let (fill, ink) = match label.emphasis {
            Emphasis::Large => (BLACK, WHITE),
            Emphasis::Normal => (WHITE, BLACK),
        };
        surface.fill_rect(
            PixelRect {
                x: label.x,
                y: label.y,
                width: label.width as i32,
                height: label.height as i32,
            },
            fill,
        );
        let padding = self.layout.padding() as i32;
        surface.draw_text(
            label.x + padding,
            label.y + padding,
            label.font_size,
            &label.text,
            ink,
        );
    }
}

/// Frame-to-surface scale on each axis.
fn scale_factors(frame: &Frame, (surface_w, surface_h): (u32, u32)) -> (f64, f64) {
    (
        surface_w as f64 / frame.width().max(1) as f64,
        surface_h as f64 / frame.height().max(1) as f64,
    )
}
