pub mod analysis;
pub mod capture;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod emotion;
pub mod error;
pub mod web;

pub use analysis::{AnalysisOutcome, EmotionAnalyzer};
pub use config::Config;
pub use error::{MoodreelError, Result};
