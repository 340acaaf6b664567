use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_width")]
    pub width: u32,
    #[serde(default = "ViewportConfig::default_height")]
    pub height: u32,
    #[serde(default = "ViewportConfig::default_wall_thickness")]
    pub wall_thickness: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhysicsConfig {
    /// Downward gravity while the simulation runs, in px/s².
    #[serde(default = "PhysicsConfig::default_run_gravity")]
    pub run_gravity: f32,
    #[serde(default = "PhysicsConfig::default_impulse_scale")]
    pub impulse_scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "EditorConfig::default_auto_hang_delay_ms")]
    pub auto_hang_delay_ms: u64,
    #[serde(default = "EditorConfig::default_auto_hang_height")]
    pub auto_hang_height: f32,
    #[serde(default = "EditorConfig::default_spawn_height")]
    pub spawn_height: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "StorageConfig::default_parts_dir")]
    pub parts_dir: PathBuf,
    #[serde(default = "StorageConfig::default_scene_dir")]
    pub scene_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub parts_dir: Option<PathBuf>,
    pub scene_dir: Option<PathBuf>,
}

impl ViewportConfig {
    const fn default_width() -> u32 {
        1280
    }

    const fn default_height() -> u32 {
        720
    }

    const fn default_wall_thickness() -> f32 {
        50.0
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            wall_thickness: Self::default_wall_thickness(),
        }
    }
}

impl PhysicsConfig {
    const fn default_run_gravity() -> f32 {
        980.0
    }

    const fn default_impulse_scale() -> f32 {
        1000.0
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self { run_gravity: Self::default_run_gravity(), impulse_scale: Self::default_impulse_scale() }
    }
}

impl EditorConfig {
    const fn default_auto_hang_delay_ms() -> u64 {
        2000
    }

    const fn default_auto_hang_height() -> f32 {
        100.0
    }

    const fn default_spawn_height() -> f32 {
        100.0
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            auto_hang_delay_ms: Self::default_auto_hang_delay_ms(),
            auto_hang_height: Self::default_auto_hang_height(),
            spawn_height: Self::default_spawn_height(),
        }
    }
}

impl StorageConfig {
    fn default_parts_dir() -> PathBuf {
        PathBuf::from("assets/parts")
    }

    fn default_scene_dir() -> PathBuf {
        PathBuf::from("scenes")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { parts_dir: Self::default_parts_dir(), scene_dir: Self::default_scene_dir() }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("[config] {err:#}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(width) = overrides.width {
            self.viewport.width = width;
        }
        if let Some(height) = overrides.height {
            self.viewport.height = height;
        }
        if let Some(dir) = &overrides.parts_dir {
            self.storage.parts_dir = dir.clone();
        }
        if let Some(dir) = &overrides.scene_dir {
            self.storage.scene_dir = dir.clone();
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.parts_dir.is_none() && self.scene_dir.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.parts_dir.is_some() {
            fields.push("parts_dir");
        }
        if self.scene_dir.is_some() {
            fields.push("scene_dir");
        }
        fields
    }
}
