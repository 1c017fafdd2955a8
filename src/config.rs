use std::path::PathBuf;

use anyhow::Context;

/// env var holding the `tracing` filter of `lzi`
pub const LOG_ENV: &str = "LZI_LOG";
pub const HISTORY_ENV: &str = "LZI_HISTORY";
pub const HISTORY_SIZE_ENV: &str = "LZI_HISTORY_SIZE";

const DEFAULT_HISTORY_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub history_path: PathBuf,
    pub history_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        let history_path = directories_next::ProjectDirs::from("io", "lazy-proxy", "lzi")
            .map_or_else(
                || PathBuf::from(".lzi-history"),
                |it| it.data_dir().join("lzi-history.txt"),
            );

        Self {
            history_path,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl Config {
    /// Defaults, overridden by `LZI_HISTORY` and `LZI_HISTORY_SIZE`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(path) = var(HISTORY_ENV) {
            config.history_path = PathBuf::from(path);
        }
        if let Some(size) = var(HISTORY_SIZE_ENV) {
            config.history_size = size
                .trim()
                .parse()
                .with_context(|| format!("{HISTORY_SIZE_ENV} is not a number: {size:?}"))?;
        }

        Ok(config)
    }
}
