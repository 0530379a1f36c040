//! Service configuration loaded from a TOML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::geocoding::DEFAULT_BASE_URL;

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Municipalities in priority order
    pub municipalities: Vec<MunicipalityConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Provider credential; `GOOGLE_API_KEY` takes precedence
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MunicipalityConfig {
    pub key: String,
    pub name: String,
    /// GeoJSON boundary file, relative to the config file
    pub path: PathBuf,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&content).context("Failed to parse config file")?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for municipality in &mut config.municipalities {
            if municipality.path.is_relative() {
                municipality.path = base_dir.join(&municipality.path);
            }
        }

        Ok(config)
    }

    /// Listen address with the port optionally replaced
    pub fn listen_addr(&self, port: Option<u16>) -> String {
        match port {
            Some(port) => {
                let host = self
                    .server
                    .listen
                    .rsplit_once(':')
                    .map(|(host, _)| host)
                    .unwrap_or(&self.server.listen);
                format!("{}:{}", host, port)
            }
            None => self.server.listen.clone(),
        }
    }
}
