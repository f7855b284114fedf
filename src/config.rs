//! Configuration parsing and management for Avaverse

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AvaverseError, ConfigError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub avatar: AvatarConfig,
    pub retarget: RetargetTuning,
    pub tracker: TrackerConfig,
    pub render: RenderConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AvaverseError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, AvaverseError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, AvaverseError> {
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AvaverseError> {
        self.retarget.validate()?;

        if self.render.fps > 240 {
            return Err(invalid("render.fps", "Frame rate must be at most 240"));
        }

        if !(1.0..=179.0).contains(&self.render.camera_fov) {
            return Err(invalid(
                "render.camera_fov",
                "Field of view must be between 1 and 179 degrees",
            ));
        }

        if self.http.enabled && self.http.port == 0 {
            return Err(invalid("http.port", "Port must be greater than 0"));
        }

        if self.tracker.input_file.is_none() && self.tracker.auto_launch {
            if self.tracker.video_path.is_none() {
                return Err(invalid(
                    "tracker.video_path",
                    "auto_launch needs a video for the tracker helper",
                ));
            }
            let path = Path::new(&self.tracker.script);
            if !path.exists() {
                tracing::warn!(
                    "Tracker auto_launch enabled but script not found at: {}",
                    self.tracker.script
                );
            }
            if self.tracker.solved_path.is_none() {
                tracing::warn!(
                    "No tracker.solved_path set; frames will carry landmarks only and nothing will be retargeted"
                );
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> AvaverseError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Avatar model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Path to the VRM/GLB model file
    pub model_path: PathBuf,
    /// Yaw applied to the avatar root so it faces the camera (radians)
    pub scene_yaw: f32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/avatar.vrm"),
            scene_yaw: std::f32::consts::PI,
        }
    }
}

/// What the hand retargeter uses for the wrist Z axis when the pose group
/// was not retargeted in the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WristFallback {
    /// Use 0 rad
    Zero,
    /// Reuse the last pose-solved Z for that side (0 until the first pose)
    #[default]
    LastKnown,
}

/// Damping and interpolation constants for every retargeted segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetTuning {
    /// Default interpolation factor toward a rotation target
    pub default_lerp: f32,

    // --- Face ---
    pub neck_damping: f32,
    /// Weight of the previous committed blink value
    pub blink_mix: f32,
    /// Weight of the previous committed vowel value
    pub vowel_mix: f32,
    /// Weight of the new pupil offset against the rolling gaze
    pub gaze_mix: f32,

    // --- Body ---
    pub hips_rotation_damping: f32,
    pub hips_position_damping: f32,
    pub hips_position_lerp: f32,
    /// Added to the solved hip height so the root sits above the ground
    pub hips_height_offset: f32,
    pub chest_damping: f32,
    pub spine_damping: f32,
    pub limb_damping: f32,

    // --- Hands ---
    pub wrist_fallback: WristFallback,
}

impl Default for RetargetTuning {
    fn default() -> Self {
        Self {
            default_lerp: 0.3,
            neck_damping: 0.7,
            blink_mix: 0.5,
            vowel_mix: 0.5,
            gaze_mix: 0.4,
            hips_rotation_damping: 0.7,
            hips_position_damping: 1.0,
            hips_position_lerp: 0.07,
            hips_height_offset: 1.0,
            chest_damping: 0.25,
            spine_damping: 0.45,
            limb_damping: 1.0,
            wrist_fallback: WristFallback::LastKnown,
        }
    }
}

impl RetargetTuning {
    /// Every damping, interpolation and mix factor must lie in [0, 1].
    pub fn validate(&self) -> Result<(), AvaverseError> {
        let factors = [
            ("retarget.default_lerp", self.default_lerp),
            ("retarget.neck_damping", self.neck_damping),
            ("retarget.blink_mix", self.blink_mix),
            ("retarget.vowel_mix", self.vowel_mix),
            ("retarget.gaze_mix", self.gaze_mix),
            ("retarget.hips_rotation_damping", self.hips_rotation_damping),
            ("retarget.hips_position_damping", self.hips_position_damping),
            ("retarget.hips_position_lerp", self.hips_position_lerp),
            ("retarget.chest_damping", self.chest_damping),
            ("retarget.spine_damping", self.spine_damping),
            ("retarget.limb_damping", self.limb_damping),
        ];

        for (field, value) in factors {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "Factor must be between 0.0 and 1.0"));
            }
        }

        Ok(())
    }
}

/// External tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Launch the tracker helper as a subprocess (requires `video_path`)
    pub auto_launch: bool,
    /// Python interpreter used for the helper
    pub python: String,
    /// Path to the tracker helper script
    pub script: String,
    /// Video file handed to the helper
    pub video_path: Option<PathBuf>,
    /// Newline-delimited solved records the helper attaches to each frame
    pub solved_path: Option<PathBuf>,
    /// Runtime tag passed to the solver ("mediapipe")
    pub runtime: String,
    /// Read newline-delimited frames from this file instead of a subprocess
    pub input_file: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            auto_launch: false,
            python: "python3".to_string(),
            script: "scripts/holistic_tracker.py".to_string(),
            video_path: None,
            solved_path: None,
            runtime: "mediapipe".to_string(),
            input_file: None,
        }
    }
}

/// Frame pacing and browser scene setup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Target frame rate of the session loop (0 = as fast as frames arrive)
    pub fps: u32,
    /// Vertical field of view in degrees
    pub camera_fov: f32,
    pub camera_position: [f32; 3],
    pub camera_target: [f32; 3],
    /// Directional light direction (normalized by the viewer)
    pub light_direction: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            camera_fov: 35.0,
            camera_position: [0.0, 0.95, 1.96],
            camera_target: [0.0, 0.95, 0.0],
            light_direction: [1.0, 1.0, 1.0],
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Enable HTTP server
    pub enabled: bool,
    /// HTTP server host
    pub host: String,
    /// HTTP server port
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_enabled: true,
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("avaverse");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/avaverse");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/avaverse");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("avaverse");
        }
    }

    PathBuf::from(".")
}
