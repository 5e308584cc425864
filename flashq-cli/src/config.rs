//! Optional `flashq.toml` config file: seeds CLI defaults for `root_dir`,
//! `max_entries` and `max_entry_size` so a caller doesn't have to repeat
//! them on every invocation. Mirrors `onyx-config`/`obsidian-config`'s
//! serde + toml + thiserror triple; the engine itself never reads this
//! file; `Create`'s arguments always come from explicit CLI flags or these
//! defaults resolved before the call.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    pub root_dir: Option<String>,
    pub max_entries: Option<u8>,
    pub max_entry_size: Option<u16>,
}

impl CliConfig {
    /// Loads `path` if it exists; a missing file is not an error, it just
    /// yields the all-`None` default.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
