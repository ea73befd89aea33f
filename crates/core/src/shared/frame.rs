use ndarray::{s, ArrayView3};

/// A single video frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

/// Pixel rectangle in frame coordinates, `(x, y)` being the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sequence number assigned by the frame source.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies out the part of `rect` that lies inside the frame.
    ///
    /// Returns `None` when nothing of the rectangle is visible.
    pub fn crop(&self, rect: PixelRect) -> Option<Frame> {
        let x1 = rect.x.max(0).min(self.width as i32) as usize;
        let y1 = rect.y.max(0).min(self.height as i32) as usize;
        let x2 = rect
            .x
            .saturating_add(rect.width)
            .max(0)
            .min(self.width as i32) as usize;
        let y2 = rect
            .y
            .saturating_add(rect.height)
            .max(0)
            .min(self.height as i32) as usize;

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let view = self.as_ndarray();
        let region = view.slice(s![y1..y2, x1..x2, ..]);
        let data: Vec<u8> = region.iter().copied().collect();

        Some(Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.index,
        ))
    }
}
