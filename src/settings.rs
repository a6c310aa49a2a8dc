use std::path::PathBuf;

use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Everything configurable about the greeting scene. Asset paths are plain
/// configuration; nothing in the core depends on their values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSettings {
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub reveal: RevealSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub card: CardSettings,
    #[serde(default = "SceneSettings::default_photos")]
    pub photos: Vec<PhotoSettings>,
    #[serde(default)]
    pub backdrop: BackdropSettings,
}

impl SceneSettings {
    pub fn load() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            info!("Using default scene settings for WebAssembly build");
            Self::default()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::load_from_path("settings.json")
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {:?} ({}). Falling back to default scene settings.",
                    path, err
                );
                Self::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("Scene settings {:?} not found. Using defaults.", path);
                Self::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default scene settings.",
                    path, err
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let settings: SceneSettings = serde_json::from_str(contents)?;
        Ok(settings.validate())
    }

    fn default_photos() -> Vec<PhotoSettings> {
        vec![
            PhotoSettings::new("public/Reach.png", [-2.0, 1.3, 0.0]),
            PhotoSettings::new("public/Lady.png", [2.0, 1.3, 0.0]),
            PhotoSettings::new("public/Padoru.png", [0.0, 1.3, -2.0]),
        ]
    }

    pub fn validate(mut self) -> Self {
        if self.window.resolution.width == 0 || self.window.resolution.height == 0 {
            warn!("Window resolution must be greater than zero. Using default resolution.");
            self.window.resolution = Resolution::default();
        }

        if self.reveal.tick_interval_ms == 0 {
            warn!("Reveal tick interval must be greater than zero. Using default.");
            self.reveal.tick_interval_ms = RevealSettings::default().tick_interval_ms;
        }

        if !(self.model.target_size.is_finite() && self.model.target_size > 0.0) {
            warn!(
                "Model target size {} is invalid. Using default.",
                self.model.target_size
            );
            self.model.target_size = ModelSettings::default().target_size;
        }

        let camera_defaults = CameraSettings::default();
        if !(self.camera.fov_y_degrees > 0.0 && self.camera.fov_y_degrees < 180.0) {
            warn!("Camera fov must be within (0, 180). Using default.");
            self.camera.fov_y_degrees = camera_defaults.fov_y_degrees;
        }
        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            warn!("Camera clip planes must satisfy 0 < near < far. Using defaults.");
            self.camera.near = camera_defaults.near;
            self.camera.far = camera_defaults.far;
        }
        if !(self.camera.damping > 0.0 && self.camera.damping <= 1.0) {
            warn!("Camera damping must be within (0, 1]. Using default.");
            self.camera.damping = camera_defaults.damping;
        }

        if self.card.size[0] <= 0.0 || self.card.size[1] <= 0.0 {
            warn!("Card size must be positive. Using default.");
            self.card.size = CardSettings::default().size;
        }

        self
    }
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            reveal: RevealSettings::default(),
            camera: CameraSettings::default(),
            model: ModelSettings::default(),
            card: CardSettings::default(),
            photos: Self::default_photos(),
            backdrop: BackdropSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "WindowSettings::default_title")]
    pub title: String,
    #[serde(default)]
    pub resolution: Resolution,
}

impl WindowSettings {
    fn default_title() -> String {
        "Happy New Year".to_string()
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            resolution: Resolution::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealSettings {
    #[serde(default = "RevealSettings::default_lines")]
    pub lines: Vec<String>,
    #[serde(default = "RevealSettings::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "RevealSettings::default_handoff_delay_ms")]
    pub handoff_delay_ms: u64,
}

impl RevealSettings {
    fn default_lines() -> Vec<String> {
        [
            "> Annie",
            "...",
            "> Happy New Year!",
            "> Made you something special~",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    const fn default_tick_interval_ms() -> u64 {
        40
    }

    const fn default_handoff_delay_ms() -> u64 {
        1000
    }
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            lines: Self::default_lines(),
            tick_interval_ms: Self::default_tick_interval_ms(),
            handoff_delay_ms: Self::default_handoff_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "CameraSettings::default_fov")]
    pub fov_y_degrees: f32,
    #[serde(default = "CameraSettings::default_near")]
    pub near: f32,
    #[serde(default = "CameraSettings::default_far")]
    pub far: f32,
    #[serde(default = "CameraSettings::default_position")]
    pub position: [f32; 3],
    #[serde(default = "CameraSettings::default_target")]
    pub target: [f32; 3],
    #[serde(default = "CameraSettings::default_damping")]
    pub damping: f32,
    #[serde(default = "CameraSettings::default_speed")]
    pub rotate_speed: f32,
    #[serde(default = "CameraSettings::default_speed")]
    pub zoom_speed: f32,
    #[serde(default = "CameraSettings::default_speed")]
    pub pan_speed: f32,
}

impl CameraSettings {
    const fn default_fov() -> f32 {
        35.0
    }

    const fn default_near() -> f32 {
        0.1
    }

    const fn default_far() -> f32 {
        1000.0
    }

    const fn default_position() -> [f32; 3] {
        [0.0, 2.0, 6.0]
    }

    const fn default_target() -> [f32; 3] {
        [0.0, 1.0, 0.0]
    }

    const fn default_damping() -> f32 {
        0.05
    }

    const fn default_speed() -> f32 {
        1.0
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: Self::default_fov(),
            near: Self::default_near(),
            far: Self::default_far(),
            position: Self::default_position(),
            target: Self::default_target(),
            damping: Self::default_damping(),
            rotate_speed: Self::default_speed(),
            zoom_speed: Self::default_speed(),
            pan_speed: Self::default_speed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "ModelSettings::default_path")]
    pub path: PathBuf,
    #[serde(default = "ModelSettings::default_target_size")]
    pub target_size: f32,
    /// Where the model's lowest point lands relative to the table surface.
    #[serde(default = "ModelSettings::default_offset")]
    pub placement_offset: [f32; 3],
}

impl ModelSettings {
    fn default_path() -> PathBuf {
        PathBuf::from("public/models/caramel_cheesecake_sliced.glb")
    }

    const fn default_target_size() -> f32 {
        1.2
    }

    const fn default_offset() -> [f32; 3] {
        [0.35, 0.25, 1.0]
    }

    pub fn placement_offset(&self) -> Vec3 {
        Vec3::from(self.placement_offset)
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            target_size: Self::default_target_size(),
            placement_offset: Self::default_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSettings {
    #[serde(default = "CardSettings::default_name")]
    pub name: String,
    #[serde(default = "CardSettings::default_texture")]
    pub texture: PathBuf,
    #[serde(default = "CardSettings::default_size")]
    pub size: [f32; 2],
    #[serde(default = "CardSettings::default_position")]
    pub position: [f32; 3],
    /// Rotation about X in radians.
    #[serde(default = "CardSettings::default_tilt")]
    pub tilt: f32,
}

impl CardSettings {
    fn default_name() -> String {
        "card".to_string()
    }

    fn default_texture() -> PathBuf {
        PathBuf::from("public/card.jpg")
    }

    const fn default_size() -> [f32; 2] {
        [1.5, 1.0]
    }

    const fn default_position() -> [f32; 3] {
        [0.0, 1.1, 1.2]
    }

    const fn default_tilt() -> f32 {
        -0.6
    }

    pub fn aspect(&self) -> f32 {
        self.size[0] / self.size[1]
    }
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            texture: Self::default_texture(),
            size: Self::default_size(),
            position: Self::default_position(),
            tilt: Self::default_tilt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSettings {
    pub texture: PathBuf,
    pub position: [f32; 3],
}

impl PhotoSettings {
    pub fn new(texture: impl Into<PathBuf>, position: [f32; 3]) -> Self {
        Self {
            texture: texture.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackdropSettings {
    #[serde(default = "BackdropSettings::default_sky")]
    pub sky_texture: PathBuf,
    #[serde(default = "BackdropSettings::default_ground")]
    pub ground_texture: PathBuf,
}

impl BackdropSettings {
    fn default_sky() -> PathBuf {
        PathBuf::from("public/Background.jpg")
    }

    fn default_ground() -> PathBuf {
        PathBuf::from("public/Ground.png")
    }
}

impl Default for BackdropSettings {
    fn default() -> Self {
        Self {
            sky_texture: Self::default_sky(),
            ground_texture: Self::default_ground(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = SceneSettings::from_json("{}").unwrap();
        assert_eq!(settings.reveal.tick_interval_ms, 40);
        assert_eq!(settings.reveal.handoff_delay_ms, 1000);
        assert_eq!(settings.reveal.lines.len(), 4);
        assert_eq!(settings.model.target_size, 1.2);
        assert_eq!(settings.model.placement_offset(), Vec3::new(0.35, 0.25, 1.0));
        assert_eq!(settings.card.name, "card");
        assert_eq!(settings.photos.len(), 3);
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let json = r#"{
            "window": { "resolution": { "width": 0, "height": 600 } },
            "reveal": { "tick_interval_ms": 0 },
            "camera": { "fov_y_degrees": 190.0, "near": 5.0, "far": 1.0, "damping": 0.0 },
            "model": { "target_size": -3.0 },
            "card": { "size": [0.0, 1.0] }
        }"#;
        let settings = SceneSettings::from_json(json).unwrap();

        assert_eq!(settings.window.resolution.width, Resolution::default().width);
        assert_eq!(settings.reveal.tick_interval_ms, 40);
        assert_eq!(settings.camera.fov_y_degrees, 35.0);
        assert_eq!(settings.camera.near, 0.1);
        assert_eq!(settings.camera.far, 1000.0);
        assert_eq!(settings.camera.damping, 0.05);
        assert_eq!(settings.model.target_size, 1.2);
        assert_eq!(settings.card.size, [1.5, 1.0]);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let json = r#"{
            "reveal": { "lines": ["hi"], "tick_interval_ms": 10, "handoff_delay_ms": 5 },
            "model": { "path": "cake.glb", "target_size": 2.0, "placement_offset": [0.0, 1.0, 0.0] },
            "photos": []
        }"#;
        let settings = SceneSettings::from_json(json).unwrap();

        assert_eq!(settings.reveal.lines, vec!["hi".to_string()]);
        assert_eq!(settings.reveal.tick_interval_ms, 10);
        assert_eq!(settings.reveal.handoff_delay_ms, 5);
        assert_eq!(settings.model.path, PathBuf::from("cake.glb"));
        assert_eq!(settings.model.target_size, 2.0);
        assert!(settings.photos.is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = SceneSettings::load_from_path("no/such/settings.json");
        assert_eq!(settings.photos.len(), 3);
        assert_eq!(settings.camera.position, [0.0, 2.0, 6.0]);
    }
}
