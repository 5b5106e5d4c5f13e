use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "FIELDFRAME_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "FIELDFRAME_DATA_DIR";

const QUALIFIER: &str = "io";
const ORGANISATION: &str = "fieldframe";
const APPLICATION: &str = "fieldframe";

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;

        let config_dir = resolve_dir(ENV_CONFIG_DIR, project_dirs.config_dir())
            .context("failed to resolve fieldframe config directory")?;
        let data_dir = resolve_dir(ENV_DATA_DIR, project_dirs.data_dir())
            .context("failed to resolve fieldframe data directory")?;

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolves the configuration file: an explicit path wins, otherwise the
    /// user config directory is consulted.
    pub fn config_file(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(anyhow!("configuration file not found: {}", path.display()));
        }

        let candidate = self.config_dir.join(CONFIG_FILE);
        if candidate.exists() {
            return Ok(candidate);
        }
        Err(anyhow!(
            "no configuration found; pass a path or create {}",
            candidate.display()
        ))
    }

    /// Search roots for named asset packs, most specific first.
    pub fn pack_roots(&self) -> Vec<PathBuf> {
        vec![
            PathBuf::from("packs"),
            self.config_dir.join("packs"),
            self.data_dir.join("packs"),
        ]
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_dir,
            data_dir,
        }
    }
}

fn resolve_dir(env_var: &str, default: &Path) -> Result<PathBuf> {
    match env::var_os(env_var) {
        Some(value) if !value.as_os_str().is_empty() => Ok(PathBuf::from(value)),
        _ => Ok(default.to_path_buf()),
    }
}
