use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::Target;

#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seconds allowed for establishing a session with a target.
    pub connect_timeout: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TargetGroup {
    pub name: String,
    pub description: Option<String>,
    pub targets: Vec<Target>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TargetsConfig {
    pub groups: Vec<TargetGroup>,
}

#[derive(Debug)]
pub struct ConfigManager {
    #[allow(dead_code)]
    config_dir: PathBuf,
    config_file: PathBuf,
    targets_file: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("fleetstat");

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        let config_file = config_dir.join("fleetstat.toml");
        let targets_file = config_dir.join("targets.toml");

        Ok(Self {
            config_dir,
            config_file,
            targets_file,
        })
    }

    /// Same manager, but reading targets from an explicit file.
    pub fn with_targets_file(targets_file: PathBuf) -> Result<Self> {
        let mut manager = Self::new()?;
        manager.targets_file = targets_file;
        Ok(manager)
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        // If config file doesn't exist, create it with default values
        if !self.config_file.exists() {
            let default_config = AppConfig::default();
            self.save_config(&default_config)?;
        }

        let content =
            fs::read_to_string(&self.config_file).context("Failed to read config file")?;

        let config: AppConfig = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_file, toml).context("Failed to write config file")?;
        Ok(())
    }

    /// Loads every configured target, flattened across groups. Duplicate
    /// addresses are dropped with a warning so a run produces exactly one
    /// outcome per address.
    pub fn load_targets(&self) -> Result<Vec<Target>> {
        if !self.targets_file.exists() {
            return Ok(Vec::new());
        }

        let content =
            fs::read_to_string(&self.targets_file).context("Failed to read targets file")?;

        let config: TargetsConfig =
            toml::from_str(&content).context("Failed to parse targets file")?;

        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for group in config.groups {
            for mut target in group.targets {
                if !seen.insert(target.address.clone()) {
                    tracing::warn!("Duplicate target address found: {}", target.address);
                    continue;
                }
                target.group = Some(group.name.clone());
                targets.push(target);
            }
        }

        tracing::info!("Loaded {} targets from {:?}", targets.len(), self.targets_file);
        Ok(targets)
    }

    pub fn get_targets_path(&self) -> &Path {
        &self.targets_file
    }
}
