use std::sync::{Arc, Mutex};

use crate::capture::{FaceRegion, Frame};
use crate::error::Result;

/// Finds faces in a frame.
///
/// Implementations may keep native state between calls, hence `&mut self`.
#[cfg_attr(test, mockall::automock)]
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>>;
}

/// Process-wide detector instance, loaded once and shared by every session.
pub type SharedDetector = Arc<Mutex<Box<dyn FaceDetector>>>;

pub fn shared_detector(detector: Box<dyn FaceDetector>) -> SharedDetector {
    Arc::new(Mutex::new(detector))
}

/// Treats the whole frame as a single face and leaves finding the actual
/// face to the classifier.
#[derive(Debug, Default, Clone)]
pub struct FullFrameDetector;

impl FaceDetector for FullFrameDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![FaceRegion::new(0, 0, frame.width() as i32, frame.height() as i32)])
    }
}
