use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use renderer::{Antialiasing, RenderPolicy, Renderer, RendererConfig};
use sceneconfig::SceneConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

const DEFAULT_SIZE: (u32, u32) = (1280, 720);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Scene configuration plus the file it came from, if any.
#[derive(Debug)]
pub struct LoadedScene {
    pub scene: SceneConfig,
    pub source: Option<PathBuf>,
}

/// Loads `explicit` if given (it must exist), otherwise `discovered` when
/// present, otherwise the built-in defaults.
pub fn load_scene(explicit: Option<&Path>, discovered: &Path) -> Result<LoadedScene> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (discovered.to_path_buf(), false),
    };

    if !required && !path.exists() {
        tracing::debug!(path = %path.display(), "no config file found; using defaults");
        return Ok(LoadedScene {
            scene: SceneConfig::default(),
            source: None,
        });
    }

    let scene = SceneConfig::load(&path)
        .with_context(|| format!("failed to load scene config {}", path.display()))?;
    tracing::debug!(path = %path.display(), panels = scene.panels.len(), "loaded scene config");
    Ok(LoadedScene {
        scene,
        source: Some(path),
    })
}

/// Merges CLI flags over the scene configuration.
pub fn build_renderer_config(args: &RunArgs, scene: SceneConfig) -> Result<RendererConfig> {
    let fps = args.fps.or(scene.display.fps);
    if let Some(value) = fps {
        if !value.is_finite() || value < 0.0 {
            bail!("--fps must be a non-negative number, got {value}");
        }
    }
    let target_fps = fps.filter(|value| *value > 0.0);

    let antialiasing = args
        .antialias
        .or_else(|| scene.display.antialias.map(Antialiasing::from))
        .unwrap_or_default();

    let policy = match &args.still_export {
        Some(path) => {
            let time = args.still_time.unwrap_or(0.0);
            if !time.is_finite() || time < 0.0 {
                bail!("--still-time must be a non-negative number of seconds, got {time}");
            }
            RenderPolicy::Export {
                time,
                path: path.clone(),
            }
        }
        None => RenderPolicy::Animate { target_fps },
    };

    Ok(RendererConfig {
        surface_size: args.size.unwrap_or(DEFAULT_SIZE),
        policy,
        antialiasing,
        scene,
        skip_reveal: args.skip_reveal,
    })
}

pub fn run(args: RunArgs, config: Option<&Path>) -> Result<()> {
    let paths = AppPaths::discover()?;
    let loaded = load_scene(config, &paths.config_file())?;
    tracing::debug!(
        config_dir = %paths.config_dir().display(),
        source = ?loaded.source,
        "resolved noirsmoke configuration"
    );

    let renderer_config = build_renderer_config(&args, loaded.scene)?;
    tracing::info!(
        policy = ?renderer_config.policy,
        skip_reveal = renderer_config.skip_reveal,
        "starting noirsmoke"
    );
    Renderer::new(renderer_config).run()
}
