pub mod deepface;

pub use deepface::DeepFaceClient;

use crate::error::Result;

/// External model that names the dominant emotion on a face.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Classifies a JPEG-encoded face crop and returns the emotion label.
    async fn classify(&self, face_jpeg: &[u8]) -> Result<String>;
}
