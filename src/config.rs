use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_UPDATE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_path: PathBuf,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// how often a contended progress update is re-merged before giving up
    #[serde(default = "default_update_attempts")]
    pub update_attempts: u32,
}

fn default_update_attempts() -> u32 {
    DEFAULT_UPDATE_ATTEMPTS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./database/progress.db"),
            log_path: None,
            update_attempts: DEFAULT_UPDATE_ATTEMPTS,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// fall back to defaults when no config file is present
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// `DATABASE_URL` wins over the configured path
    pub fn database_url(&self) -> String {
        let _ = dotenvy::dotenv();
        match dotenvy::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => format!("sqlite://{}", self.database_path.display()),
        }
    }
}
