use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::params::EngineParams;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_controls")]
    pub default_controls: Vec<String>,
    #[serde(default)]
    pub default_user: Option<String>,
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
    #[serde(default)]
    pub engine: EngineParams,
}

fn default_controls() -> Vec<String> {
    vec!["blitz".to_string(), "rapid".to_string()]
}
fn default_report_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ratingscope")
        .join("reports")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_controls: default_controls(),
            default_user: None,
            report_dir: default_report_dir(),
            engine: EngineParams::default(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ratingscope")
            .join("config.toml")
    }

    /// Lower-case and de-duplicate the control list, falling back to the
    /// defaults when nothing usable is left.
    pub fn normalize_controls(&mut self) {
        let mut seen = Vec::new();
        for control in &self.default_controls {
            let control = control.trim().to_lowercase();
            if !control.is_empty() && !seen.contains(&control) {
                seen.push(control);
            }
        }
        self.default_controls = if seen.is_empty() {
            default_controls()
        } else {
            seen
        };
    }
}
