use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::capture::{FaceAnnotation, Frame};
use crate::error::{MoodreelError, Result};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Something that yields video frames for a capture session.
pub trait FrameSource: Send {
    /// Next frame, or `None` once the source has nothing left.
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Shows the frame with its classified faces. Returns `true` when the
    /// viewer asked to stop capturing.
    fn present(&mut self, _frame: &Frame, _faces: &[FaceAnnotation]) -> Result<bool> {
        Ok(false)
    }

    /// Frees the underlying device. Called once at the end of a session.
    fn release(&mut self) {}
}

/// Opens a fresh frame source for every capture session.
pub trait FrameSourceFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameSource>>;
}

/// Replays still images from a directory, in file-name order, once each.
pub struct ImageDirectorySource {
    files: Vec<PathBuf>,
    next: usize,
}

impl ImageDirectorySource {
    pub fn open(dir: &Path) -> Result<Self> {
        let files = list_images(dir)?;
        info!("Replaying {} frames from {:?}", files.len(), dir);
        Ok(Self { files, next: 0 })
    }
}

impl FrameSource for ImageDirectorySource {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };

        debug!("Loading frame {:?}", path);
        let image = image::open(path)
            .map_err(|e| MoodreelError::CaptureError(format!("Failed to load frame {:?}: {}", path, e)))?
            .to_rgb8();

        let frame = Frame::new(self.next as u64, image);
        self.next += 1;
        Ok(Some(frame))
    }
}

pub struct ImageDirectorySourceFactory {
    dir: PathBuf,
}

impl ImageDirectorySourceFactory {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl FrameSourceFactory for ImageDirectorySourceFactory {
    fn open(&self) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(ImageDirectorySource::open(&self.dir)?))
    }
}

// image files directly inside `dir`, sorted by name
fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| MoodreelError::CaptureError(format!("Failed to read frames directory {:?}: {}", dir, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(MoodreelError::from)?.path();
        if !path.is_file() {
            continue;
        }
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
