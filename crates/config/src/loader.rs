use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::SetupConfig};

/// Standard settings file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "clawsetup.toml",
    "clawsetup.yaml",
    "clawsetup.yml",
    "clawsetup.json",
];

/// Environment variable overriding `endpoint.base_url`.
pub const ENV_ENDPOINT: &str = "CLAWSETUP_ENDPOINT";
/// Environment variable overriding `endpoint.timeout_secs`.
pub const ENV_TIMEOUT_SECS: &str = "CLAWSETUP_TIMEOUT_SECS";
/// Environment variable overriding `wizard.provider`.
pub const ENV_PROVIDER: &str = "CLAWSETUP_PROVIDER";

/// Load settings from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<SetupConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load settings from standard locations.
///
/// Search order:
/// 1. `./clawsetup.{toml,yaml,yml,json}`
/// 2. `~/.config/clawsetup/clawsetup.{toml,yaml,yml,json}`
///
/// Falls back to `SetupConfig::default()` when nothing is found or the file
/// cannot be parsed. Environment overrides are applied in both cases.
pub fn discover_and_load() -> SetupConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading settings");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load settings, using defaults");
                SetupConfig::default()
            })
        },
        None => {
            debug!("no settings file found, using defaults");
            SetupConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Apply `CLAWSETUP_*` overrides from the process environment.
pub fn apply_env_overrides(config: &mut SetupConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut SetupConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(url) = get(ENV_ENDPOINT) {
        config.endpoint.base_url = url;
    }
    if let Some(raw) = get(ENV_TIMEOUT_SECS) {
        match raw.parse::<u64>() {
            Ok(secs) => config.endpoint.timeout_secs = Some(secs),
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid {ENV_TIMEOUT_SECS}"),
        }
    }
    if let Some(provider) = get(ENV_PROVIDER) {
        config.wizard.provider = provider;
    }
}

/// Find the first settings file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global settings directory (`~/.config/clawsetup/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "clawsetup").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<SetupConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported settings format: .{ext}"),
    }
}
