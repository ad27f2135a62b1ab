//! Configuration file handling
//!
//! The file holds the plugin sections read by [`server_monitor::MonitorSettings`]
//! plus a `[logging]` section for this host.

use crate::cli::Args;
use serde::{Deserialize, Serialize};
use server_monitor::config::default_advertisement_format;
use server_monitor::{AddressList, Flag, GeneralSettings, MonitorSettings, ServersSettings};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<GeneralSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<ServersSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter
    #[serde(default = "default_level")]
    pub level: String,
    /// JSON formatting
    #[serde(default)]
    pub json_format: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            json_format: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Some(GeneralSettings {
                advertise_on_map_change: Some(Flag::Bool(false)),
                advertisement_format: Some(default_advertisement_format()),
            }),
            servers: Some(ServersSettings {
                game_monitor: Some(AddressList::List(Vec::new())),
                quake3: Some(AddressList::List(Vec::new())),
                bf3: Some(AddressList::List(Vec::new())),
            }),
            commands: Some(BTreeMap::from([("servers".to_string(), "guest".to_string())])),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration, writing a default file first if none exists
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// CLI flags win over the file
    pub fn apply_overrides(&mut self, args: &Args) {
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if args.json_logs {
            self.logging.json_format = true;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {VALID_LEVELS:?}",
                &self.logging.level
            ));
        }
        Ok(())
    }

    /// The sections the plugin reads
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            settings: self.settings.clone(),
            servers: self.servers.clone(),
            commands: self.commands.clone(),
        }
    }
}
