use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

/// Plays a still image, or a directory of images, as a live stream.
///
/// The current frame is chosen by wall-clock time at `fps`, looping over
/// the sequence, so a slow consumer skips frames instead of falling behind.
pub struct ImageSequenceSource {
    frames: Vec<Frame>,
    fps: f64,
    started: Instant,
}

impl ImageSequenceSource {
    /// Loads `path` (a single image or a directory of images, sorted by name).
    pub fn open(path: &Path, fps: f64) -> Result<Self, Box<dyn std::error::Error>> {
        if fps <= 0.0 || !fps.is_finite() {
            return Err(format!("fps must be positive, got {fps}").into());
        }

        let paths = if path.is_dir() {
            list_images(path)?
        } else {
            vec![path.to_path_buf()]
        };
        if paths.is_empty() {
            return Err(format!("No images found in {}", path.display()).into());
        }

        let frames = paths
            .iter()
            .map(|p| load_frame(p))
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Loaded {} frame(s) from {} at {fps} fps",
            frames.len(),
            path.display()
        );

        Ok(Self::from_frames(frames, fps))
    }

    pub fn from_frames(frames: Vec<Frame>, fps: f64) -> Self {
        Self {
            frames,
            fps,
            started: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `elapsed` since playback started: `(stream index, slot)`.
    fn position_at(&self, elapsed: Duration) -> (usize, usize) {
        let stream_index = (elapsed.as_secs_f64() * self.fps) as usize;
        (stream_index, stream_index % self.frames.len())
    }

    fn frame_at(&self, elapsed: Duration) -> Option<Frame> {
        if self.frames.is_empty() {
            return None;
        }
        let (stream_index, slot) = self.position_at(elapsed);
        let frame = &self.frames[slot];
        Some(Frame::new(
            frame.data().to_vec(),
            frame.width(),
            frame.height(),
            stream_index,
        ))
    }
}

impl FrameSource for ImageSequenceSource {
    fn current_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        self.frame_at(self.started.elapsed())
            .ok_or_else(|| "Frame source has no frames".into())
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_image(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_frame(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 0))
}
