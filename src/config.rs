use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub static CONFIG: OnceCell<Config> = OnceCell::new();

const DB_FILENAME: &str = "fieldops.db";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    pub fieldops: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const FIELDOPS_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            fieldops: Self::FIELDOPS_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        let str_original = self.fieldops.clone();
        self.fieldops = self.fieldops.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.fieldops.as_str()) {
            eprintln!(
                "Config error: fieldops log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::FIELDOPS_LEVEL
            );
            self.fieldops = Self::FIELDOPS_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    const DEFAULT_HOST: &str = "127.0.0.1";
    const DEFAULT_PORT: u16 = 7420;

    fn default() -> Self {
        ServerConfig {
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
        }
    }

    fn ensure_valid(&mut self) {
        self.host = self.host.trim().to_string();
        if self.host.is_empty() {
            eprintln!(
                "Config error: server host is empty - using default of '{}'",
                Self::DEFAULT_HOST
            );
            self.host = Self::DEFAULT_HOST.to_owned();
        }
        if self.port == 0 {
            eprintln!(
                "Config error: server port of 0 is invalid - using default of {}",
                Self::DEFAULT_PORT
            );
            self.port = Self::DEFAULT_PORT;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EngineConfig {
    preview_horizon_days: u32,
}

impl EngineConfig {
    // Horizons the preview UI offers. Anything else in the config file is
    // repaired to the default.
    const HORIZONS: [u32; 5] = [7, 14, 30, 60, 90];
    const DEFAULT_HORIZON: u32 = 30;

    pub fn preview_horizon_days(&self) -> u32 {
        self.preview_horizon_days
    }

    fn default() -> Self {
        EngineConfig {
            preview_horizon_days: Self::DEFAULT_HORIZON,
        }
    }

    fn ensure_valid(&mut self) {
        if !Self::HORIZONS.contains(&self.preview_horizon_days) {
            eprintln!(
                "Config error: preview horizon of {} days is invalid - using default of {}",
                self.preview_horizon_days,
                Self::DEFAULT_HORIZON
            );
            self.preview_horizon_days = Self::DEFAULT_HORIZON;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Loads the configuration from a TOML file located in the app's data directory.
    /// If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");

        let default_config = Config {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
        };

        // If the config file doesn't exist, write the default configuration to disk.
        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    eprintln!(
                        "Failed to create configuration directory {}: {}",
                        parent.display(),
                        e
                    );
                }
            }
            if let Ok(toml_string) = toml::to_string_pretty(&default_config) {
                if let Err(e) = fs::write(&config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            } else {
                eprintln!("Failed to serialize default config.");
            }
        }

        // Build a Figment instance that uses the defaults merged with the TOML file (if it exists)
        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(&config_path));

        // Attempt to extract the configuration; on error, log a message and fall back to defaults.
        let mut config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.server.ensure_valid();
        self.engine.ensure_valid();
    }

    /// The loaded configuration. Panics if called before `load_config` stored it,
    /// which only happens during startup ordering bugs.
    pub fn get() -> &'static Config {
        CONFIG.get().expect("config accessed before initialization")
    }

    pub fn get_server_host() -> String {
        Self::get().server.host.clone()
    }

    pub fn get_server_port() -> u16 {
        Self::get().server.port
    }

    pub fn get_preview_horizon_days() -> u32 {
        Self::get().engine.preview_horizon_days()
    }

    /// Database file location inside the app's data directory.
    pub fn database_path(project_dirs: &ProjectDirs) -> PathBuf {
        project_dirs.data_local_dir().join(DB_FILENAME)
    }
}
