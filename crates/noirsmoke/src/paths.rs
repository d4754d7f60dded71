use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "NOIRSMOKE_CONFIG_DIR";
pub const CONFIG_FILE_NAME: &str = "noirsmoke.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "NoirSmoke";
const APPLICATION: &str = "noirsmoke";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    from_env: bool,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self {
                config_dir,
                from_env: true,
            });
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
            from_env: false,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// True when the directory came from `NOIRSMOKE_CONFIG_DIR`.
    pub fn overridden(&self) -> bool {
        self.from_env
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
