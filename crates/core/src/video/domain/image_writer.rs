use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a single rendered frame as an image file.
pub trait ImageWriter: Send {
    /// Writes `frame` to `path`; the format follows the file extension.
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
