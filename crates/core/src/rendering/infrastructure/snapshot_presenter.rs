use std::path::PathBuf;

use crate::rendering::domain::frame_presenter::FramePresenter;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

pub const SNAPSHOT_FILE_NAME: &str = "latest.png";

/// Writes every `every`-th presented frame to `<dir>/latest.png`.
pub struct SnapshotPresenter {
    writer: Box<dyn ImageWriter>,
    path: PathBuf,
    every: usize,
    presented: usize,
    written: usize,
}

impl SnapshotPresenter {
    pub fn new(writer: Box<dyn ImageWriter>, dir: PathBuf, every: usize) -> Self {
        Self {
            writer,
            path: dir.join(SNAPSHOT_FILE_NAME),
            every: every.max(1),
            presented: 0,
            written: 0,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl FramePresenter for SnapshotPresenter {
    fn present(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let due = self.presented % self.every == 0;
        self.presented += 1;
        if !due {
            return Ok(());
        }
        self.writer.write(&self.path, frame)?;
        self.written += 1;
        log::debug!("Wrote snapshot {} ({})", self.written, self.path.display());
        Ok(())
    }
}

/// Discards frames. Used when no snapshot directory is configured.
#[derive(Default)]
pub struct NullPresenter;

impl FramePresenter for NullPresenter {
    fn present(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
