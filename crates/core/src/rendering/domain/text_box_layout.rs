use crate::shared::face_box::FaceBox;
use crate::shared::overlay_config::OverlayStyle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
    /// `Name` and `Title`.
    Large,
    Normal,
}

/// One opaque label: a filled rectangle with a single line of text.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub text: String,
    pub emphasis: Emphasis,
    pub font_size: u32,
}

impl LabelRect {
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// Labels for one box, top to bottom, plus the first free row below them.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelStack {
    pub labels: Vec<LabelRect>,
    pub next_top: i32,
}

/// Stacks identity labels beside a face box.
///
/// The stack starts at the box's top edge and its left side sits on the
/// box's right edge. Label width grows with character count at half the
/// font size per character; labels touch vertically with no gap, so the
/// stack height is `labels × (font size + 2 × padding)`.
#[derive(Clone, Debug)]
pub struct TextBoxLayout {
    big_font_size: u32,
    font_size: u32,
    padding: u32,
    line_width: u32,
}

impl TextBoxLayout {
    pub fn new(style: &OverlayStyle) -> Self {
        Self {
            big_font_size: style.big_font_size,
            font_size: style.font_size,
            padding: style.padding,
            line_width: style.box_line_width,
        }
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    pub fn label_size(&self, text: &str, font_size: u32) -> (u32, u32) {
        let chars = text.chars().count() as u32;
        let width = chars * font_size / 2 + 2 * self.padding + self.line_width;
        let height = font_size + 2 * self.padding;
        (width, height)
    }

    /// Places one label at `(x, top)`; the next label belongs at its bottom.
    pub fn place(&self, text: String, emphasis: Emphasis, x: i32, top: i32) -> LabelRect {
        let font_size = match emphasis {
            Emphasis::Large => self.big_font_size,
            Emphasis::Normal => self.font_size,
        };
        let (width, height) = self.label_size(&text, font_size);
        LabelRect {
            x,
            y: top,
            width,
            height,
            text,
            emphasis,
            font_size,
        }
    }

    /// Lays out `Name`, `Title`, then the remaining fields as `key: value`.
    ///
    /// A box without an identity gets an empty stack.
    pub fn layout(&self, face: &FaceBox) -> LabelStack {
        let mut stack = LabelStack {
            labels: Vec::new(),
            next_top: face.top,
        };
        let Some(identity) = face.identity() else {
            return stack;
        };

        let reserved = [identity.name(), identity.title()];
        let large = reserved
            .into_iter()
            .flatten()
            .map(|text| (text.to_string(), Emphasis::Large));
        let normal = identity
            .extra_fields()
            .map(|(key, value)| (format!("{key}: {value}"), Emphasis::Normal));

        for (text, emphasis) in large.chain(normal) {
            let label = self.place(text, emphasis, face.right, stack.next_top);
            stack.next_top = label.bottom();
            stack.labels.push(label);
        }
        stack
    }
}
