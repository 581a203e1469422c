pub mod types;

use crate::error::{AuditError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".kube-audit.toml";

/// Get the global config file path (~/.kube-audit.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (dir/.kube-audit.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load configuration from file or use defaults.
///
/// An explicit path must exist and parse. Otherwise the local config is
/// tried first, then the global one; files that cannot be read or parsed are
/// skipped with a warning.
pub fn load_config(explicit: Option<&Path>, local_dir: Option<&Path>) -> Result<types::Config> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let candidates = local_dir
        .map(local_config_path)
        .into_iter()
        .chain(global_config_path());
    for path in candidates {
        if !path.exists() {
            continue;
        }
        match read_config(&path) {
            Ok(config) => {
                log::debug!("Loaded config from {}", path.display());
                return Ok(config);
            }
            Err(e) => log::warn!("Ignoring config: {}", e),
        }
    }

    Ok(types::Config::default())
}

fn read_config(path: &Path) -> Result<types::Config> {
    let content = fs::read_to_string(path).map_err(|e| AuditError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| AuditError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
