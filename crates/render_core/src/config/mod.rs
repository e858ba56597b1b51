//! Configuration system
//!
//! Renderer settings are plain serde structs that can be loaded from and
//! saved to TOML or RON files through the [`Config`] trait.

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Shadow map settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowMapConfig {
    /// Run the shadow pass at all
    pub enabled: bool,
    /// Re-render shadow maps every frame; when false only after `needs_update`
    pub auto_update: bool,
}

impl Default for ShadowMapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            auto_update: true,
        }
    }
}

/// # Renderer Configuration
///
/// Frame-level behaviour of the [`Renderer`](crate::render::Renderer):
/// sorting, automatic clearing, pixel ratio, clipping and shadows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Sort opaque draws front-to-back and transparent draws back-to-front
    pub sort_objects: bool,
    /// Clear the bound framebuffer before the opaque pass
    pub auto_clear: bool,
    /// Include the color buffer in the automatic clear
    pub auto_clear_color: bool,
    /// Include the depth buffer in the automatic clear
    pub auto_clear_depth: bool,
    /// Include the stencil buffer in the automatic clear
    pub auto_clear_stencil: bool,
    /// Background clear color [R, G, B, A] (0.0-1.0 range)
    pub clear_color: [f32; 4],
    /// Device pixel ratio applied to viewports and line widths
    pub pixel_ratio: f32,
    /// Honour per-material clipping planes
    pub local_clipping_enabled: bool,
    /// Shadow map pass settings
    pub shadow_map: ShadowMapConfig,
    /// Maximum simultaneous morph targets
    pub max_morph_targets: usize,
    /// Maximum simultaneous morph targets when morph normals are used
    pub max_morph_normals: usize,
    /// Colors are premultiplied by alpha
    pub premultiplied_alpha: bool,
}

impl RendererConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable depth sorting
    pub fn with_sort_objects(mut self, sort: bool) -> Self {
        self.sort_objects = sort;
        self
    }

    /// Enable or disable the automatic clear
    pub fn with_auto_clear(mut self, auto_clear: bool) -> Self {
        self.auto_clear = auto_clear;
        self
    }

    /// Set background clear color [R, G, B, A] (0.0-1.0 range)
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Set the device pixel ratio
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio.max(0.1);
        self
    }

    /// Enable the shadow map pass
    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadow_map.enabled = enabled;
        self
    }

    /// Enable per-material clipping planes
    pub fn with_local_clipping(mut self, enabled: bool) -> Self {
        self.local_clipping_enabled = enabled;
        self
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            sort_objects: true,
            auto_clear: true,
            auto_clear_color: true,
            auto_clear_depth: true,
            auto_clear_stencil: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            pixel_ratio: 1.0,
            local_clipping_enabled: false,
            shadow_map: ShadowMapConfig::default(),
            max_morph_targets: 8,
            max_morph_normals: 4,
            premultiplied_alpha: true,
        }
    }
}

impl Config for RendererConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_config_default() {
        let config = RendererConfig::default();
        assert!(config.sort_objects);
        assert!(config.auto_clear);
        assert_eq!(config.pixel_ratio, 1.0);
        assert!(!config.shadow_map.enabled);
        assert_eq!(config.max_morph_targets, 8);
    }

    #[test]
    fn test_renderer_config_partial_toml() {
        let config: RendererConfig = toml::from_str(
            "sort_objects = false\npixel_ratio = 2.0\n\n[shadow_map]\nenabled = true\n",
        )
        .unwrap();
        assert!(!config.sort_objects);
        assert_eq!(config.pixel_ratio, 2.0);
        assert!(config.shadow_map.enabled);
        assert!(config.shadow_map.auto_update);
        assert!(config.auto_clear);
    }

    #[test]
    fn test_renderer_config_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join("render_core_config_test.ron");
        let path = path.to_string_lossy().to_string();
        let config = RendererConfig::new().with_sort_objects(false).with_clear_color([0.1, 0.2, 0.3, 1.0]);
        config.save_to_file(&path).unwrap();
        let loaded = RendererConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unsupported_format() {
        let result = RendererConfig::load_from_file("renderer.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_)) | Err(ConfigError::UnsupportedFormat(_))));
        let err = RendererConfig::default().save_to_file("renderer.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
