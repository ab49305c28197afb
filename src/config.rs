use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, StoryForgeError};

/// Name of the configuration file stored inside the `.storyforge` directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Name of the hidden directory used to store StoryForge metadata.
pub const STORYFORGE_DIR: &str = ".storyforge";

/// Configuration for a StoryForge workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryForgeConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Project file, relative to the workspace root.
    pub project_file: String,
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Maximum characters in a single MCP tool response before truncation.
    pub max_response_chars: usize,
}

impl Default for StoryForgeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            project_file: "project.json".to_string(),
            log_filter: "warn".to_string(),
            max_response_chars: 15_000,
        }
    }
}

/// Returns the path to the `.storyforge` directory within the given root.
pub fn get_storyforge_dir(root: &Path) -> PathBuf {
    root.join(STORYFORGE_DIR)
}

/// Returns the path to `config.toml` within the `.storyforge` directory.
pub fn get_config_path(root: &Path) -> PathBuf {
    get_storyforge_dir(root).join(CONFIG_FILENAME)
}

/// Returns the absolute path of the project file named by the config.
pub fn project_path(root: &Path, config: &StoryForgeConfig) -> PathBuf {
    root.join(&config.project_file)
}

/// Loads the configuration from disk, or the defaults if no file exists.
pub fn load_config(root: &Path) -> Result<StoryForgeConfig> {
    let config_path = get_config_path(root);

    if !config_path.exists() {
        return Ok(StoryForgeConfig::default());
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| StoryForgeError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    toml::from_str(&contents).map_err(|e| StoryForgeError::Config {
        message: format!(
            "failed to parse config file '{}': {}",
            config_path.display(),
            e
        ),
    })
}

/// Saves the configuration to disk using an atomic write.
pub fn save_config(root: &Path, config: &StoryForgeConfig) -> Result<()> {
    let storyforge_dir = get_storyforge_dir(root);
    fs::create_dir_all(&storyforge_dir).map_err(|e| StoryForgeError::Config {
        message: format!(
            "failed to create storyforge directory '{}': {}",
            storyforge_dir.display(),
            e
        ),
    })?;

    let config_path = get_config_path(root);
    let tmp_path = config_path.with_extension("tmp");

    let contents = toml::to_string_pretty(config).map_err(|e| StoryForgeError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, contents).map_err(|e| StoryForgeError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, &config_path).map_err(|e| StoryForgeError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            config_path.display(),
            e
        ),
    })?;

    Ok(())
}
