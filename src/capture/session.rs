use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capture::{
    encode_jpeg, FaceAnnotation, FrameSource, FrameSourceFactory, SharedDetector, DEFAULT_JPEG_QUALITY,
};
use crate::classifier::EmotionClassifier;
use crate::emotion::{dominant_emotion, normalize_label};
use crate::error::{FailureMode, MoodreelError, Result};

/// Knobs for one capture session.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub duration: Duration,
    pub preview: bool,
    pub max_frames: Option<u64>,
    pub jpeg_quality: u8,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            preview: false,
            max_frames: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    DurationElapsed,
    SourceExhausted,
    QuitRequested,
    FrameLimit,
}

/// What a capture session saw.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub frames_read: u64,
    pub faces_detected: u64,
    pub skipped_faces: u64,
    pub samples: Vec<String>,
    pub stop_reason: StopReason,
    pub dominant_emotion: Option<String>,
}

/// One capture-detect-classify run over a freshly opened frame source.
///
/// The source is opened, read, presented and released on one blocking thread.
pub struct CaptureSession {
    id: Uuid,
    sources: Arc<dyn FrameSourceFactory>,
    detector: SharedDetector,
    classifier: Arc<dyn EmotionClassifier>,
    settings: CaptureSettings,
}

// running counters while the loop is going
struct Progress {
    frames_read: u64,
    faces_detected: u64,
    skipped_faces: u64,
    samples: Vec<String>,
}

impl CaptureSession {
    pub fn new(
        sources: Arc<dyn FrameSourceFactory>,
        detector: SharedDetector,
        classifier: Arc<dyn EmotionClassifier>,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sources,
            detector,
            classifier,
            settings,
        }
    }

    /// Runs the blocking capture loop off the async executor.
    pub async fn run(self) -> Result<SessionReport> {
        let handle = Handle::current();
        tokio::task::spawn_blocking(move || self.run_blocking(&handle))
            .await
            .map_err(|e| MoodreelError::CaptureError(format!("Capture task failed: {}", e)))?
    }

    fn run_blocking(self, handle: &Handle) -> Result<SessionReport> {
        let mut source = self.sources.open()?;
        info!(
            "Capture session {} started ({:?}, preview: {})",
            self.id, self.settings.duration, self.settings.preview
        );
        let started_at = Utc::now();
        let start = Instant::now();

        let mut progress = Progress {
            frames_read: 0,
            faces_detected: 0,
            skipped_faces: 0,
            samples: Vec::new(),
        };

        let outcome = self.capture_loop(source.as_mut(), handle, start, &mut progress);
        // the device is released whatever happened
        source.release();
        let stop_reason = outcome?;

        let report = SessionReport {
            id: self.id,
            started_at,
            elapsed: start.elapsed(),
            frames_read: progress.frames_read,
            faces_detected: progress.faces_detected,
            skipped_faces: progress.skipped_faces,
            dominant_emotion: dominant_emotion(&progress.samples),
            samples: progress.samples,
            stop_reason,
        };

        info!(
            "Capture session {} finished: {} frames, {} faces, {} samples, dominant {:?} ({:?})",
            report.id,
            report.frames_read,
            report.faces_detected,
            report.samples.len(),
            report.dominant_emotion,
            report.stop_reason
        );
        Ok(report)
    }

    fn capture_loop(
        &self,
        source: &mut dyn FrameSource,
        handle: &Handle,
        start: Instant,
        progress: &mut Progress,
    ) -> Result<StopReason> {
        loop {
            let Some(frame) = source.read_frame()? else {
                return Ok(StopReason::SourceExhausted);
            };
            progress.frames_read += 1;

            let regions = {
                let mut detector = self
                    .detector
                    .lock()
                    .map_err(|_| MoodreelError::DetectionError("Face detector lock poisoned".to_string()))?;
                detector.detect(&frame)?
            };
            debug!("Frame {}: {} faces", frame.index, regions.len());

            let mut annotations = Vec::with_capacity(regions.len());
            for region in regions {
                let Some(face) = frame.crop(&region) else {
                    debug!("Face {:?} lies outside frame {}", region, frame.index);
                    continue;
                };
                progress.faces_detected += 1;

                let jpeg = encode_jpeg(&face, self.settings.jpeg_quality)?;
                let label = match handle.block_on(self.classifier.classify(&jpeg)) {
                    Ok(label) => {
                        let label = normalize_label(&label);
                        progress.samples.push(label.clone());
                        Some(label)
                    }
                    Err(e) if MoodreelError::failure_mode_of(e.as_ref()) == FailureMode::SkipSample => {
                        warn!("Skipping face in frame {}: {}", frame.index, e);
                        progress.skipped_faces += 1;
                        None
                    }
                    Err(e) => return Err(e),
                };

                annotations.push(FaceAnnotation { region, label });
            }

            let quit = if self.settings.preview {
                source.present(&frame, &annotations)?
            } else {
                false
            };

            if start.elapsed() >= self.settings.duration {
                return Ok(StopReason::DurationElapsed);
            }
            if quit {
                return Ok(StopReason::QuitRequested);
            }
            if self.settings.max_frames.is_some_and(|max| progress.frames_read >= max) {
                return Ok(StopReason::FrameLimit);
            }
        }
    }
}
