use serde::{Deserialize, Serialize};

/// Placeholder when a listing has no critic score.
pub const NO_RATING: &str = "N/A";
/// Placeholder when a listing has no poster.
pub const NO_IMAGE: &str = "No Image";

/// One movie from a genre listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    pub rating: String,
    pub image_url: String,
}

impl Movie {
    pub fn new(title: impl Into<String>, rating: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rating: rating.into(),
            image_url: image_url.into(),
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_url != NO_IMAGE
    }
}
