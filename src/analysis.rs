use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::capture::{
    shared_detector, CaptureSession, CaptureSettings, FaceDetector, FrameSourceFactory, FullFrameDetector,
    ImageDirectorySourceFactory, SessionReport, SharedDetector, DEFAULT_JPEG_QUALITY,
};
use crate::catalog::{recommend_movies, Movie, MovieCatalog, RottenTomatoesCatalog};
use crate::classifier::{DeepFaceClient, EmotionClassifier};
use crate::config::{CaptureBackend, Config, DetectionBackend};
use crate::emotion::{genre_for_emotion, EmotionTally, Genre};
use crate::error::{FailureMode, MoodreelError, Result};

/// Everything one analysis produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub report: SessionReport,
    pub dominant_emotion: Option<String>,
    pub genre: Option<Genre>,
    pub tally: EmotionTally,
    pub movies: Vec<Movie>,
}

/// Capture, classify, vote and scrape, one analysis at a time.
pub struct EmotionAnalyzer {
    sources: Arc<dyn FrameSourceFactory>,
    detector: SharedDetector,
    classifier: Arc<dyn EmotionClassifier>,
    catalog: Arc<dyn MovieCatalog>,
    settings: CaptureSettings,
    // the camera can only serve one session
    session_lock: Mutex<()>,
}

impl EmotionAnalyzer {
    pub fn new(
        sources: Arc<dyn FrameSourceFactory>,
        detector: SharedDetector,
        classifier: Arc<dyn EmotionClassifier>,
        catalog: Arc<dyn MovieCatalog>,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            sources,
            detector,
            classifier,
            catalog,
            settings,
            session_lock: Mutex::new(()),
        }
    }

    /// Wires the backends named in the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let sources: Arc<dyn FrameSourceFactory> = match config.capture.backend {
            CaptureBackend::ImageDirectory => {
                Arc::new(ImageDirectorySourceFactory::new(config.capture.frames_dir.clone()))
            }
            CaptureBackend::Camera => camera_factory(config)?,
        };

        // loaded once, shared by every session
        let detector: Box<dyn FaceDetector> = match config.detection.backend {
            DetectionBackend::FullFrame => Box::new(FullFrameDetector),
            DetectionBackend::HaarCascade => haar_detector(config)?,
        };

        let settings = CaptureSettings {
            duration: config.capture.duration,
            preview: config.capture.preview,
            max_frames: config.capture.max_frames,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        };

        Ok(Self::new(
            sources,
            shared_detector(detector),
            Arc::new(DeepFaceClient::new(&config.classifier)?),
            Arc::new(RottenTomatoesCatalog::new(&config.catalog)?),
            settings,
        ))
    }

    pub async fn analyze(&self) -> Result<AnalysisOutcome> {
        let _guard = self.session_lock.lock().await;

        let session = CaptureSession::new(
            self.sources.clone(),
            self.detector.clone(),
            self.classifier.clone(),
            self.settings.clone(),
        );
        let report = session.run().await?;

        let tally = EmotionTally::from_samples(&report.samples);
        let dominant_emotion = report.dominant_emotion.clone();

        let (genre, movies) = match &dominant_emotion {
            Some(emotion) => (genre_for_emotion(emotion), self.fetch_movies(emotion).await?),
            None => {
                info!("No face was classified, skipping movie lookup");
                (None, Vec::new())
            }
        };

        Ok(AnalysisOutcome {
            report,
            dominant_emotion,
            genre,
            tally,
            movies,
        })
    }

    async fn fetch_movies(&self, emotion: &str) -> Result<Vec<Movie>> {
        match recommend_movies(self.catalog.as_ref(), emotion).await {
            Ok(movies) => Ok(movies),
            Err(e) if MoodreelError::failure_mode_of(e.as_ref()) == FailureMode::DegradeToEmpty => {
                warn!("Movie lookup for '{}' failed, showing no movies: {}", emotion, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(feature = "opencv")]
fn camera_factory(config: &Config) -> Result<Arc<dyn FrameSourceFactory>> {
    Ok(Arc::new(crate::capture::opencv_backend::CameraSourceFactory::new(
        config.capture.camera_index,
        config.capture.preview,
    )))
}

#[cfg(not(feature = "opencv"))]
fn camera_factory(_config: &Config) -> Result<Arc<dyn FrameSourceFactory>> {
    Err(MoodreelError::ConfigError("Camera capture needs a build with the 'opencv' feature".to_string()).into())
}

#[cfg(feature = "opencv")]
fn haar_detector(config: &Config) -> Result<Box<dyn FaceDetector>> {
    Ok(Box::new(crate::capture::opencv_backend::HaarCascadeDetector::load(&config.detection)?))
}

#[cfg(not(feature = "opencv"))]
fn haar_detector(_config: &Config) -> Result<Box<dyn FaceDetector>> {
    Err(MoodreelError::ConfigError("Haar cascade detection needs a build with the 'opencv' feature".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Frame, FrameSource};
    use crate::catalog::MockMovieCatalog;
    use crate::classifier::MockEmotionClassifier;
    use image::RgbImage;
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct BlankFrames {
        left: u64,
    }

    impl FrameSource for BlankFrames {
        fn read_frame(&mut self) -> Result<Option<Frame>> {
            if self.left == 0 {
                return Ok(None);
            }
            self.left -= 1;
            Ok(Some(Frame::new(self.left, RgbImage::new(16, 16))))
        }
    }

    struct BlankFrameFactory {
        frames: u64,
        opened: AtomicUsize,
    }

    impl FrameSourceFactory for BlankFrameFactory {
        fn open(&self) -> Result<Box<dyn FrameSource>> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(BlankFrames { left: self.frames }))
        }
    }

    fn analyzer(frames: u64, label: &'static str, catalog: MockMovieCatalog) -> EmotionAnalyzer {
        let mut classifier = MockEmotionClassifier::new();
        classifier.expect_classify().returning(move |_| Ok(label.to_string()));

        EmotionAnalyzer::new(
            Arc::new(BlankFrameFactory {
                frames,
                opened: AtomicUsize::new(0),
            }),
            shared_detector(Box::new(FullFrameDetector)),
            Arc::new(classifier),
            Arc::new(catalog),
            CaptureSettings {
                duration: Duration::from_secs(30),
                ..CaptureSettings::default()
            },
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_analyze_happy_path() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_movies_for_genre()
            .with(eq(Genre::Thriller))
            .times(1)
            .returning(|_| Ok(vec![Movie::new("Heat", "88%", "https://img/heat.jpg")]));

        let outcome = analyzer(3, "happy", catalog).analyze().await.unwrap();
        assert_eq!(outcome.dominant_emotion.as_deref(), Some("happy"));
        assert_eq!(outcome.genre, Some(Genre::Thriller));
        assert_eq!(outcome.tally.count("happy"), 3);
        assert_eq!(outcome.movies.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_frames_skips_lookup() {
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_movies_for_genre().never();

        let outcome = analyzer(0, "happy", catalog).analyze().await.unwrap();
        assert_eq!(outcome.dominant_emotion, None);
        assert_eq!(outcome.genre, None);
        assert!(outcome.movies.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_network_failure_degrades_to_no_movies() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_movies_for_genre()
            .returning(|_| Err(MoodreelError::NetworkError("connection reset".to_string()).into()));

        let outcome = analyzer(2, "sad", catalog).analyze().await.unwrap();
        assert_eq!(outcome.dominant_emotion.as_deref(), Some("sad"));
        assert_eq!(outcome.genre, Some(Genre::Drama));
        assert!(outcome.movies.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unmapped_emotion_has_no_genre() {
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_movies_for_genre().never();

        let outcome = analyzer(2, "contempt", catalog).analyze().await.unwrap();
        assert_eq!(outcome.dominant_emotion.as_deref(), Some("contempt"));
        assert_eq!(outcome.genre, None);
        assert!(outcome.movies.is_empty());
    }

    #[test]
    fn test_from_config_with_default_backends() {
        let mut config = Config::default();
        config.capture.backend = CaptureBackend::ImageDirectory;
        config.detection.backend = DetectionBackend::FullFrame;
        assert!(EmotionAnalyzer::from_config(&config).is_ok());
    }

    #[cfg(not(feature = "opencv"))]
    #[test]
    fn test_from_config_camera_without_opencv() {
        let mut config = Config::default();
        config.capture.backend = CaptureBackend::Camera;
        assert!(EmotionAnalyzer::from_config(&config).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_source_opened_per_analysis() {
        let factory = Arc::new(BlankFrameFactory {
            frames: 1,
            opened: AtomicUsize::new(0),
        });
        let mut classifier = MockEmotionClassifier::new();
        classifier.expect_classify().returning(|_| Ok("fear".to_string()));
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_movies_for_genre().returning(|_| Ok(Vec::new()));

        let analyzer = EmotionAnalyzer::new(
            factory.clone(),
            shared_detector(Box::new(FullFrameDetector)),
            Arc::new(classifier),
            Arc::new(catalog),
            CaptureSettings::default(),
        );

        analyzer.analyze().await.unwrap();
        analyzer.analyze().await.unwrap();
        assert_eq!(factory.opened.load(Ordering::SeqCst), 2);
    }

    /// Counts sources that are open at the same time.
    struct ExclusiveCameraFactory {
        open_now: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    struct ExclusiveCamera {
        open_now: Arc<AtomicUsize>,
        left: u64,
    }

    impl FrameSourceFactory for ExclusiveCameraFactory {
        fn open(&self) -> Result<Box<dyn FrameSource>> {
            let now = self.open_now.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            Ok(Box::new(ExclusiveCamera {
                open_now: self.open_now.clone(),
                left: 3,
            }))
        }
    }

    impl FrameSource for ExclusiveCamera {
        fn read_frame(&mut self) -> Result<Option<Frame>> {
            if self.left == 0 {
                return Ok(None);
            }
            self.left -= 1;
            std::thread::sleep(Duration::from_millis(10));
            Ok(Some(Frame::new(self.left, RgbImage::new(16, 16))))
        }

        fn release(&mut self) {
            self.open_now.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_analyses_take_turns() {
        let open_now = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut classifier = MockEmotionClassifier::new();
        classifier.expect_classify().returning(|_| Ok("neutral".to_string()));
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_movies_for_genre().times(4).returning(|_| Ok(Vec::new()));

        let analyzer = Arc::new(EmotionAnalyzer::new(
            Arc::new(ExclusiveCameraFactory {
                open_now: open_now.clone(),
                peak: peak.clone(),
            }),
            shared_detector(Box::new(FullFrameDetector)),
            Arc::new(classifier),
            Arc::new(catalog),
            CaptureSettings {
                duration: Duration::from_secs(30),
                ..CaptureSettings::default()
            },
        ));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let analyzer = analyzer.clone();
                tokio::spawn(async move { analyzer.analyze().await.map(|outcome| outcome.report.frames_read) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 3);
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(open_now.load(Ordering::SeqCst), 0);
    }
}
