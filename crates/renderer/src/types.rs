use sceneconfig::{AntialiasSetting, SceneConfig};

use crate::runtime::RenderPolicy;

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl From<AntialiasSetting> for Antialiasing {
    fn from(setting: AntialiasSetting) -> Self {
        match setting {
            AntialiasSetting::Auto => Self::Auto,
            AntialiasSetting::Off => Self::Off,
            AntialiasSetting::Samples2 => Self::Samples(2),
            AntialiasSetting::Samples4 => Self::Samples(4),
            AntialiasSetting::Samples8 => Self::Samples(8),
            AntialiasSetting::Samples16 => Self::Samples(16),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// Mirrors the CLI flags merged over `noirsmoke.toml`.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in logical pixels.
    pub surface_size: (u32, u32),
    /// Animate in a window, or export a single frame.
    pub policy: RenderPolicy,
    pub antialiasing: Antialiasing,
    /// Pointer smoothing, pixel-ratio cap, reveal timings and panels.
    pub scene: SceneConfig,
    /// Start with the reveal already finished.
    pub skip_reveal: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            policy: RenderPolicy::default(),
            antialiasing: Antialiasing::default(),
            scene: SceneConfig::default(),
            skip_reveal: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antialias_settings_map_to_sample_counts() {
        assert_eq!(Antialiasing::from(AntialiasSetting::Auto), Antialiasing::Auto);
        assert_eq!(Antialiasing::from(AntialiasSetting::Off), Antialiasing::Off);
        assert_eq!(
            Antialiasing::from(AntialiasSetting::Samples8),
            Antialiasing::Samples(8)
        );
    }

    #[test]
    fn default_config_animates_uncapped() {
        let config = RendererConfig::default();
        assert_eq!(config.policy, RenderPolicy::Animate { target_fps: None });
        assert!(!config.skip_reveal);
        assert_eq!(config.scene.panels.len(), 3);
    }
}
