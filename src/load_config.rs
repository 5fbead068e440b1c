/// `load_config` module: loads and adapts a static YAML config into the
/// internal [`SyncConfig`].
///
/// This module is the only place where untrusted YAML is parsed and mapped to
/// strongly-typed internal structs. Secrets (API tokens, folder identifiers)
/// never live in the file; they come from the environment and are consumed by
/// the client constructors directly.
///
/// # Errors
/// All errors use `anyhow::Error` for context-rich diagnostics, surfaced at
/// the CLI boundary.
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::config::{RootMapping, SyncConfig};

#[derive(Debug, Deserialize)]
struct RawConfig {
    sync: SyncSection,
}

#[derive(Debug, Deserialize)]
struct SyncSection {
    roots: Vec<RootEntry>,
    #[serde(default)]
    excluded_title_keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RootEntry {
    page_id: String,
    folder_name: String,
}

/// Loads a static YAML config file (no secrets) into a [`SyncConfig`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if raw.sync.roots.is_empty() {
        error!(config_path = ?path_ref, "Config declares no roots to synchronise");
        return Err(anyhow::anyhow!("Config must declare at least one root"));
    }

    Ok(SyncConfig {
        roots: raw
            .sync
            .roots
            .into_iter()
            .map(|entry| RootMapping {
                page_id: entry.page_id,
                folder_name: entry.folder_name,
            })
            .collect(),
        excluded_title_keywords: raw.sync.excluded_title_keywords,
    })
}
