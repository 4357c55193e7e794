use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::MoodreelError;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Bounding box of a detected face, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Intersects the region with a `frame_width` x `frame_height` frame.
    /// Returns `None` when nothing of the region is left inside the frame.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<FaceRegion> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.x.saturating_add(self.width)).min(frame_width as i32);
        let y2 = (self.y.saturating_add(self.height)).min(frame_height as i32);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(FaceRegion::new(x1, y1, x2 - x1, y2 - y1))
    }
}

/// A face region plus the emotion it was classified as, for previews.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAnnotation {
    pub region: FaceRegion,
    pub label: Option<String>,
}

/// One captured video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Cuts a face out of the frame. The region is clamped first.
    pub fn crop(&self, region: &FaceRegion) -> Option<RgbImage> {
        let clamped = region.clamp_to(self.width(), self.height())?;
        Some(
            imageops::crop_imm(
                &self.image,
                clamped.x as u32,
                clamped.y as u32,
                clamped.width as u32,
                clamped.height as u32,
            )
            .to_image(),
        )
    }
}

/// Encodes a face crop as JPEG for the classifier.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, MoodreelError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(image)?;
    Ok(buf)
}
