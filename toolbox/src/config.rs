use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = "toolbox.yaml";

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct ScanConfig {
    pub timeout_ms: Option<u64>,
    pub services: Option<PathBuf>,
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct CrackConfig {
    pub wordlist: Option<PathBuf>,
    pub salts: Option<PathBuf>,
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub scan: Option<ScanConfig>,
    pub crack: Option<CrackConfig>,
}

/// Load an explicitly named config file, or `./toolbox.yaml` when present.
///
/// A named file that cannot be read or parsed is an error. The implicit default is
/// skipped silently when it is missing and with a warning when it is malformed.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    match path {
        Some(p) => {
            let s = fs::read_to_string(p).with_context(|| format!("reading config {}", p.display()))?;
            let cfg = serde_yaml::from_str(&s).with_context(|| format!("parsing config {}", p.display()))?;
            Ok(Some(cfg))
        }
        None => {
            let p = Path::new(DEFAULT_CONFIG);
            let Ok(s) = fs::read_to_string(p) else { return Ok(None) };
            match serde_yaml::from_str(&s) {
                Ok(cfg) => Ok(Some(cfg)),
                Err(e) => {
                    log::warn!("ignoring {}: {}", DEFAULT_CONFIG, e);
                    Ok(None)
                }
            }
        }
    }
}
