//! Optional `vizual.toml` at the graph root

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VizualError};
use crate::model::{ColorRule, FilterConfig, default_color_rules};

/// Config file name, looked up in the graph root.
pub const CONFIG_FILE: &str = "vizual.toml";

/// Contents of `vizual.toml`. Every section is optional.
///
/// ```toml
/// active_mode = false
///
/// [filters]
/// exclude_patterns = ["**/target/**"]
/// max_nodes = 2000
///
/// [[colors]]
/// kind = "folder"
/// color = "#FFD700"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizualConfig {
    pub filters: FilterConfig,
    pub colors: Vec<ColorRule>,
    pub active_mode: bool,
}

impl Default for VizualConfig {
    fn default() -> Self {
        VizualConfig {
            filters: FilterConfig::default(),
            colors: default_color_rules(),
            active_mode: false,
        }
    }
}

/// Get config file path
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load the config for `root`. A missing file yields the defaults.
pub fn load_config(root: &Path) -> Result<VizualConfig> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(VizualConfig::default());
    }

    let text = std::fs::read_to_string(&path)
        .map_err(|e| VizualError::Configuration(format!("cannot read {}: {e}", path.display())))?;
    let config: VizualConfig = toml::from_str(&text)
        .map_err(|e| VizualError::Configuration(format!("invalid {}: {e}", path.display())))?;

    tracing::debug!("Config loaded from: {}", path.display());
    Ok(config)
}
