use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use image::{Rgb, RgbImage};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use moodreel::capture::{shared_detector, CaptureSettings, FullFrameDetector, ImageDirectorySourceFactory};
use moodreel::catalog::{Movie, MovieCatalog, NO_IMAGE, NO_RATING};
use moodreel::classifier::EmotionClassifier;
use moodreel::emotion::Genre;
use moodreel::{web, EmotionAnalyzer, MoodreelError, Result};

/// Labels faces by their top-left pixel: bright frames are happy, dark ones sad.
struct BrightnessClassifier;

#[async_trait::async_trait]
impl EmotionClassifier for BrightnessClassifier {
    async fn classify(&self, face_jpeg: &[u8]) -> Result<String> {
        let face = image::load_from_memory(face_jpeg)
            .map_err(|e| MoodreelError::ClassifierError(e.to_string()))?
            .to_rgb8();
        let label = if face.get_pixel(0, 0)[0] > 127 { "happy" } else { "sad" };
        Ok(label.to_string())
    }
}

struct FixedCatalog;

#[async_trait::async_trait]
impl MovieCatalog for FixedCatalog {
    async fn movies_for_genre(&self, genre: Genre) -> Result<Vec<Movie>> {
        Ok(vec![
            Movie::new(format!("{} pick", genre.display_name()), "91%", "https://images.example.com/pick.jpg"),
            Movie::new("Tom & Jerry", NO_RATING, NO_IMAGE),
        ])
    }
}

fn write_frame(dir: &Path, name: &str, shade: u8) {
    RgbImage::from_pixel(32, 32, Rgb([shade, shade, shade]))
        .save(dir.join(name))
        .unwrap();
}

fn app(frames_dir: &Path) -> Router {
    let analyzer = EmotionAnalyzer::new(
        Arc::new(ImageDirectorySourceFactory::new(frames_dir.to_path_buf())),
        shared_detector(Box::new(FullFrameDetector)),
        Arc::new(BrightnessClassifier),
        Arc::new(FixedCatalog),
        CaptureSettings {
            duration: Duration::from_secs(30),
            ..CaptureSettings::default()
        },
    );
    web::create_router(Arc::new(analyzer))
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_analyze() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze_emotion")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_index_page_has_form() {
    let frames = TempDir::new().unwrap();
    let response = app(frames.path())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("action=\"/analyze_emotion\""));
    assert!(page.contains("method=\"post\""));
}

#[tokio::test]
async fn test_health() {
    let frames = TempDir::new().unwrap();
    let response = app(frames.path())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_renders_dominant_emotion_and_movies() {
    let frames = TempDir::new().unwrap();
    write_frame(frames.path(), "001.png", 250);
    write_frame(frames.path(), "002.png", 10);
    write_frame(frames.path(), "003.png", 240);

    let response = app(frames.path()).oneshot(post_analyze()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("You look <span>happy</span>"));
    assert!(page.contains("<li>happy: 2</li>"));
    assert!(page.contains("<li>sad: 1</li>"));
    assert!(page.contains("Thriller pick"));
    assert!(page.contains("Tom &amp; Jerry"));
    assert!(page.contains("<div class=\"poster\">No Image</div>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_without_frames() {
    let frames = TempDir::new().unwrap();

    let response = app(frames.path()).oneshot(post_analyze()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No face detected"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_failure_is_generic_error_page() {
    let frames = TempDir::new().unwrap();
    let missing = frames.path().join("gone");

    let response = app(&missing).oneshot(post_analyze()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("Something went wrong"));
}

#[tokio::test]
async fn test_analyze_requires_post() {
    let frames = TempDir::new().unwrap();
    let response = app(frames.path())
        .oneshot(Request::builder().uri("/analyze_emotion").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
