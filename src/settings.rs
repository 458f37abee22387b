//! Persistent render settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::util::{Error, Result};

/// Settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    // Sampling
    pub max_samples: u32, // 0 = refine forever
    pub max_depth: u32,   // bounces per sample ("Reflections")
    pub seed: u32,

    // Raymarching defaults for SDF nodes that don't set their own
    pub default_steps: u32,
    pub default_step_multiplier: f32,

    // Output
    pub background: [f32; 4],
    pub error_color: [f32; 4],
    pub render_size: Option<[u32; 2]>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_samples: 0,
            max_depth: 4,
            seed: 0,
            default_steps: 70,
            default_step_multiplier: 1.0,
            background: [0.25, 0.25, 0.25, 1.0],
            error_color: [1.0, 0.0, 1.0, 1.0],
            render_size: None,
        }
    }
}

pub const MAX_DEPTH_LIMIT: u32 = 16;

impl RenderSettings {
    /// Get settings file path
    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("sdf-tracer");
            std::fs::create_dir_all(&p).ok();
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the user config dir, falling back to defaults
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|s| serde_json::from_str::<Self>(&s).ok())
            .unwrap_or_default()
            .validated()
    }

    /// Load settings from an explicit file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&text)?;
        Ok(settings.validated())
    }

    /// Save settings to the user config dir
    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = std::fs::write(path, json);
            }
        }
    }

    /// Clamp values into ranges the kernels can handle
    pub fn validated(mut self) -> Self {
        self.max_depth = self.max_depth.clamp(1, MAX_DEPTH_LIMIT);
        self.default_steps = self.default_steps.max(1);
        if !(self.default_step_multiplier > 0.0 && self.default_step_multiplier <= 1.0) {
            self.default_step_multiplier = 1.0;
        }
        if let Some([w, h]) = self.render_size {
            if w == 0 || h == 0 {
                self.render_size = None;
            }
        }
        self
    }
}
