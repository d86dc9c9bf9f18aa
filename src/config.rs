use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Settings for the demo server binary.
///
/// Loaded from the YAML file named by `LIBHTTP_CONFIG` when set; every
/// section falls back to its defaults. `LISTEN` overrides the listen address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub reader: ReaderConfig,
    pub static_files: Option<StaticFilesConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Limits applied while reading a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Size of each socket read
    pub read_buffer_size: usize,
    /// Upper bound on request line plus headers
    pub max_head_size: usize,
    /// Upper bound on an accepted `Content-Length`
    pub max_body_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 4096,
            max_head_size: 64 * 1024,
            max_body_size: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// Directory served at `/`
    pub root: PathBuf,
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_index() -> String {
    "index.html".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load), reading variables through `var`.
    pub fn load_with(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match var("LIBHTTP_CONFIG") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                Self::from_yaml(&raw).with_context(|| format!("parsing config file {path}"))?
            }
            None => Self::default(),
        };

        if let Some(addr) = var("LISTEN") {
            cfg.server.listen_addr = addr;
        }

        Ok(cfg)
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
