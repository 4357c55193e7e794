//! Webcam capture, Haar cascade detection and the preview window, backed by
//! OpenCV. Only built with the `opencv` feature.

use image::RgbImage;
use opencv::core::{Mat, Point, Rect, Scalar, Size, Vec3b, VecN, Vector};
use opencv::prelude::*;
use opencv::{highgui, imgproc, objdetect, videoio};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::capture::{FaceAnnotation, FaceDetector, FaceRegion, Frame, FrameSource, FrameSourceFactory};
use crate::config::DetectionConfig;
use crate::error::{MoodreelError, Result};

const PREVIEW_WINDOW: &str = "frame";

fn capture_err(err: opencv::Error) -> MoodreelError {
    MoodreelError::CaptureError(err.to_string())
}

fn detection_err(err: opencv::Error) -> MoodreelError {
    MoodreelError::DetectionError(err.to_string())
}

/// Webcam frames through `cv::VideoCapture`.
pub struct CameraSource {
    capture: videoio::VideoCapture,
    preview: bool,
    next_index: u64,
}

impl CameraSource {
    pub fn open(camera_index: i32, preview: bool) -> Result<Self> {
        let capture = videoio::VideoCapture::new(camera_index, videoio::CAP_ANY).map_err(capture_err)?;
        if !capture.is_opened().map_err(capture_err)? {
            return Err(MoodreelError::CaptureError(format!("Could not open camera {}", camera_index)).into());
        }

        if preview {
            highgui::named_window(PREVIEW_WINDOW, highgui::WINDOW_AUTOSIZE).map_err(capture_err)?;
        }

        info!("Opened camera {}", camera_index);
        Ok(Self {
            capture,
            preview,
            next_index: 0,
        })
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        let grabbed = self.capture.read(&mut mat).map_err(capture_err)?;
        if !grabbed || mat.rows() == 0 || mat.cols() == 0 {
            debug!("Camera returned no frame");
            return Ok(None);
        }

        let frame = Frame::new(self.next_index, bgr_mat_to_rgb(&mat)?);
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn present(&mut self, frame: &Frame, faces: &[FaceAnnotation]) -> Result<bool> {
        if !self.preview {
            return Ok(false);
        }

        let mut mat = rgb_to_bgr_mat(&frame.image)?;
        for face in faces {
            let region = face.region;
            let rect = Rect::new(region.x, region.y, region.width, region.height);
            // blue box, red label (BGR)
            imgproc::rectangle(&mut mat, rect, Scalar::new(255.0, 0.0, 0.0, 0.0), 3, imgproc::LINE_8, 0)
                .map_err(capture_err)?;

            if let Some(label) = &face.label {
                imgproc::put_text(
                    &mut mat,
                    &format!("Emotion: {}", label),
                    Point::new(region.x, region.y - 10),
                    imgproc::FONT_HERSHEY_SIMPLEX,
                    0.9,
                    Scalar::new(0.0, 0.0, 255.0, 0.0),
                    2,
                    imgproc::LINE_8,
                    false,
                )
                .map_err(capture_err)?;
            }
        }

        highgui::imshow(PREVIEW_WINDOW, &mat).map_err(capture_err)?;
        let key = highgui::wait_key(1).map_err(capture_err)?;
        Ok(key & 0xff == 'q' as i32)
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release camera: {}", e);
        }
        if self.preview {
            if let Err(e) = highgui::destroy_all_windows() {
                warn!("Failed to close preview window: {}", e);
            }
        }
    }
}

pub struct CameraSourceFactory {
    camera_index: i32,
    preview: bool,
}

impl CameraSourceFactory {
    pub fn new(camera_index: i32, preview: bool) -> Self {
        Self { camera_index, preview }
    }
}

impl FrameSourceFactory for CameraSourceFactory {
    fn open(&self) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(CameraSource::open(self.camera_index, self.preview)?))
    }
}

/// Viola-Jones frontal face detector.
pub struct HaarCascadeDetector {
    classifier: objdetect::CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
    min_face_size: i32,
}

impl HaarCascadeDetector {
    pub fn load(config: &DetectionConfig) -> Result<Self> {
        let path: &Path = &config.cascade_path;
        if !path.exists() {
            return Err(MoodreelError::DetectionError(format!("Cascade file not found: {:?}", path)).into());
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| MoodreelError::DetectionError(format!("Cascade path is not UTF-8: {:?}", path)))?;

        let classifier = objdetect::CascadeClassifier::new(path_str).map_err(detection_err)?;
        info!("Loaded Haar cascade from {:?}", path);

        Ok(Self {
            classifier,
            scale_factor: config.scale_factor,
            min_neighbors: config.min_neighbors,
            min_face_size: config.min_face_size,
        })
    }
}

impl FaceDetector for HaarCascadeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>> {
        let gray = image::imageops::grayscale(&frame.image);
        let gray_mat = Mat::new_rows_cols_with_data(gray.height() as i32, gray.width() as i32, gray.as_raw().as_slice())
            .map_err(detection_err)?
            .try_clone()
            .map_err(detection_err)?;

        let mut faces = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &gray_mat,
                &mut faces,
                self.scale_factor,
                self.min_neighbors,
                0,
                Size::new(self.min_face_size, self.min_face_size),
                Size::new(0, 0),
            )
            .map_err(detection_err)?;

        Ok(faces
            .iter()
            .map(|r| FaceRegion::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}

fn bgr_mat_to_rgb(mat: &Mat) -> Result<RgbImage> {
    let (width, height) = (mat.cols() as u32, mat.rows() as u32);
    let bytes = mat.data_bytes().map_err(capture_err)?;

    let mut rgb = Vec::with_capacity(bytes.len());
    for px in bytes.chunks_exact(3) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }

    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| MoodreelError::CaptureError("Camera frame is not 8-bit BGR".to_string()).into())
}

fn rgb_to_bgr_mat(image: &RgbImage) -> Result<Mat> {
    let pixels: Vec<Vec3b> = image.pixels().map(|p| VecN([p[2], p[1], p[0]])).collect();
    let mat = Mat::new_rows_cols_with_data(image.height() as i32, image.width() as i32, pixels.as_slice())
        .map_err(capture_err)?
        .try_clone()
        .map_err(capture_err)?;
    Ok(mat)
}
