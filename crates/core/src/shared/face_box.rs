use crate::shared::frame::PixelRect;
use crate::shared::identity::Identity;

/// A detected face: edges in frame coordinates plus an optional identity.
///
/// Edges arrive on the wire as `[top, right, bottom, left]`. A box is
/// identified at most once; [`FaceBox::with_identity`] produces the
/// replacement element rather than mutating in place.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
    identity: Option<Identity>,
}

impl FaceBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
            identity: None,
        }
    }

    /// Builds a box from wire order `[top, right, bottom, left]`.
    pub fn from_edges(edges: [i32; 4]) -> Self {
        let [top, right, bottom, left] = edges;
        Self::new(top, right, bottom, left)
    }

    pub fn edges(&self) -> [i32; 4] {
        [self.top, self.right, self.bottom, self.left]
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True unless `right > left` and `bottom > top`.
    pub fn is_degenerate(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub fn crop_rect(&self) -> PixelRect {
        PixelRect {
            x: self.left,
            y: self.top,
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    pub fn with_identity(self, identity: Identity) -> Self {
        debug_assert!(self.identity.is_none(), "identity is attached only once");
        Self {
            identity: Some(identity),
            ..self
        }
    }

    /// Maps the edges from frame space into a surface scaled by `(sx, sy)`.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            top: (self.top as f64 * sy).round() as i32,
            right: (self.right as f64 * sx).round() as i32,
            bottom: (self.bottom as f64 * sy).round() as i32,
            left: (self.left as f64 * sx).round() as i32,
            identity: self.identity.clone(),
        }
    }
}
