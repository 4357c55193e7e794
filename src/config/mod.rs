use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{MoodreelError, Result};

pub const MAX_MOVIE_RESULTS: usize = 10;
const MAX_CAPTURE_DURATION: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub capture: CaptureConfig,
    pub detection: DetectionConfig,
    pub classifier: ClassifierConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureBackend {
    /// Live webcam through OpenCV.
    Camera,
    /// Still images replayed from `frames_dir`.
    ImageDirectory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    pub backend: CaptureBackend,
    pub camera_index: i32,
    pub frames_dir: PathBuf,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub preview: bool,
    pub max_frames: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionBackend {
    HaarCascade,
    FullFrame,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    pub backend: DetectionBackend,
    pub cascade_path: PathBuf,
    pub scale_factor: f64,
    pub min_neighbors: i32,
    /// Smallest face side in pixels; 0 lets the cascade pick any size.
    pub min_face_size: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    pub endpoint: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub detector_backend: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    pub base_url: String,
    pub max_results: usize,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        // live camera and haar cascade need the opencv build
        let (capture_backend, detection_backend) = if cfg!(feature = "opencv") {
            (CaptureBackend::Camera, DetectionBackend::HaarCascade)
        } else {
            (CaptureBackend::ImageDirectory, DetectionBackend::FullFrame)
        };

        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            capture: CaptureConfig {
                backend: capture_backend,
                camera_index: 0,
                frames_dir: PathBuf::from("./frames"),
                duration: Duration::from_secs(5),
                preview: true,
                max_frames: None,
            },
            detection: DetectionConfig {
                backend: detection_backend,
                cascade_path: PathBuf::from("haarcascade_frontalface_default.xml"),
                scale_factor: 1.1,
                min_neighbors: 4,
                min_face_size: 0,
            },
            classifier: ClassifierConfig {
                endpoint: "http://127.0.0.1:5005".to_string(),
                timeout: Duration::from_secs(30),
                detector_backend: "skip".to_string(),
            },
            catalog: CatalogConfig {
                base_url: "https://www.rottentomatoes.com/browse/movies_in_theaters/genres:".to_string(),
                max_results: MAX_MOVIE_RESULTS,
                timeout: Duration::from_secs(10),
                user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36".to_string(),
            },
        }
    }
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[async_trait::async_trait]
pub trait ConfigManager {
    async fn load_config(&self) -> Result<Config>;
    async fn save_config(&self, config: &Config) -> Result<()>;
    fn validate_config(&self, config: &Config) -> Result<()>;
}

pub struct FileConfigManager {
    config_path: PathBuf,
}

impl FileConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }
}

#[async_trait::async_trait]
impl ConfigManager for FileConfigManager {
    async fn load_config(&self) -> Result<Config> {
        info!("Loading configuration from {:?}", self.config_path);

        // check if config file exists, create default if not
        if !self.config_path.exists() {
            warn!("Configuration file not found, creating default config at {:?}", self.config_path);
            self.create_default_config().await?;
        }

        let config_content = fs::read_to_string(&self.config_path)
            .map_err(|e| MoodreelError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&config_content)
            .map_err(|e| MoodreelError::ConfigError(format!("Failed to parse TOML config: {}", e)))?;

        self.validate_config(&config)?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    fn validate_config(&self, config: &Config) -> Result<()> {
        debug!("Validating configuration");

        // checking server config
        if config.server.host.trim().is_empty() {
            return Err(MoodreelError::ConfigError("server.host cannot be empty".to_string()).into());
        }
        if config.server.port < 1024 {
            return Err(MoodreelError::ConfigError("server.port must be between 1024 and 65535".to_string()).into());
        }

        // checking capture config
        if config.capture.duration.is_zero() {
            return Err(MoodreelError::ConfigError("capture.duration must be greater than 0".to_string()).into());
        }
        if config.capture.duration > MAX_CAPTURE_DURATION {
            return Err(MoodreelError::ConfigError("capture.duration cannot exceed 10 minutes".to_string()).into());
        }
        if config.capture.max_frames == Some(0) {
            return Err(MoodreelError::ConfigError("capture.max_frames must be greater than 0".to_string()).into());
        }
        if config.capture.backend == CaptureBackend::Camera && !cfg!(feature = "opencv") {
            return Err(MoodreelError::ConfigError(
                "capture.backend 'camera' needs a build with the 'opencv' feature".to_string(),
            )
            .into());
        }
        if config.capture.camera_index < 0 {
            return Err(MoodreelError::ConfigError("capture.camera_index cannot be negative".to_string()).into());
        }

        // checking detection config
        if config.detection.backend == DetectionBackend::HaarCascade && !cfg!(feature = "opencv") {
            return Err(MoodreelError::ConfigError(
                "detection.backend 'haar_cascade' needs a build with the 'opencv' feature".to_string(),
            )
            .into());
        }
        if config.detection.scale_factor <= 1.0 {
            return Err(MoodreelError::ConfigError("detection.scale_factor must be greater than 1.0".to_string()).into());
        }
        if config.detection.min_neighbors < 0 {
            return Err(MoodreelError::ConfigError("detection.min_neighbors cannot be negative".to_string()).into());
        }
        if config.detection.min_face_size < 0 {
            return Err(MoodreelError::ConfigError("detection.min_face_size cannot be negative".to_string()).into());
        }

        // checking outbound urls
        if !is_http_url(&config.classifier.endpoint) {
            return Err(MoodreelError::ConfigError("classifier.endpoint must start with http:// or https://".to_string()).into());
        }
        if !is_http_url(&config.catalog.base_url) {
            return Err(MoodreelError::ConfigError("catalog.base_url must start with http:// or https://".to_string()).into());
        }

        if config.catalog.max_results == 0 || config.catalog.max_results > MAX_MOVIE_RESULTS {
            return Err(MoodreelError::ConfigError(format!(
                "catalog.max_results must be between 1 and {}",
                MAX_MOVIE_RESULTS
            ))
            .into());
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    async fn save_config(&self, config: &Config) -> Result<()> {
        info!("Saving configuration to {:?}", self.config_path);

        let toml_content = toml::to_string_pretty(config)
            .map_err(|e| MoodreelError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(&self.config_path, toml_content)
            .map_err(|e| MoodreelError::ConfigError(format!("Failed to write config file: {}", e)))?;

        info!("Configuration saved successfully");
        Ok(())
    }
}

impl FileConfigManager {
    /// Create a default configuration file
    async fn create_default_config(&self) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| MoodreelError::ConfigError(format!("Failed to create config directory: {}", e)))?;
            }
        }

        self.save_config(&Config::default()).await?;
        info!("Default configuration file created at {:?}", self.config_path);
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
