//! Configuration system for emon.
//!
//! Layered configuration hierarchy:
//!
//! 1. **Built-in defaults** — hardcoded in [`EmonConfig::default()`]
//! 2. **User global config** — `~/.emon/config.toml`
//! 3. **Project local config** — `.emon.toml` in the current working directory
//! 4. **Environment variables** — `EMON_*` overrides (highest precedence)
//!
//! Later layers override earlier ones at the field level. Malformed or
//! missing files are skipped silently — a broken config file must never
//! keep the client from starting.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Top-level emon configuration. All sections and fields are optional in the
/// TOML files — missing values fall back to the previous layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmonConfig {
    pub backend: BackendConfig,
    pub poll: PollConfig,
    pub output: OutputConfig,
}

/// `[backend]` — where the monitoring API lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend, no trailing slash required.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// `[poll]` — live watch cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Wall-clock spacing between live fetches in milliseconds.
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 5_000 }
    }
}

/// `[output]` — default rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format: `table`, `json`, or `csv`.
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "table".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration: defaults → global TOML → project
/// TOML → env overrides. Primary entry point for every command.
pub fn load() -> EmonConfig {
    let mut config = EmonConfig::default();

    if let Some(global) = read_toml_layer(global_config_file()) {
        merge_layer(&mut config, global);
    }
    if let Some(project) = read_toml_layer(project_config_file()) {
        merge_layer(&mut config, project);
    }
    apply_env_overrides(&mut config);

    config
}

/// `~/.emon/config.toml`, if a home directory can be resolved.
pub fn global_config_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".emon").join("config.toml"))
}

/// `.emon.toml` in the current working directory.
pub fn project_config_file() -> Option<PathBuf> {
    std::env::current_dir().ok().map(|cwd| cwd.join(".emon.toml"))
}

/// Write the built-in defaults to the global config path, creating
/// `~/.emon/` if needed. Refuses to overwrite an existing file.
pub fn init_global() -> Result<PathBuf> {
    let path = global_config_file().context("could not resolve the home directory")?;
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let toml_text = toml::to_string_pretty(&EmonConfig::default())
        .context("failed to serialize default config")?;
    fs::write(&path, toml_text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Render the resolved configuration as TOML for `emon config show`.
pub fn to_toml_text(config: &EmonConfig) -> Result<String> {
    toml::to_string_pretty(config).context("failed to serialize config")
}

/// Parse one file layer as a raw TOML table. `None` for missing paths,
/// unreadable files, or invalid TOML.
fn read_toml_layer(path: Option<PathBuf>) -> Option<toml::Table> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    content.parse::<toml::Table>().ok()
}

/// Overlay a raw TOML layer onto the config at field granularity: only keys
/// present in the layer replace the base, everything else survives.
fn merge_layer(config: &mut EmonConfig, layer: toml::Table) {
    let Ok(base_table) = toml::Table::try_from(&*config) else {
        return;
    };
    let mut base = toml::Value::Table(base_table);
    deep_merge(&mut base, toml::Value::Table(layer));
    if let Ok(merged) = base.try_into::<EmonConfig>() {
        *config = merged;
    }
}

/// Recursively overlay `layer` onto `base`. Tables merge key-by-key; every
/// other value type replaces wholesale.
fn deep_merge(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base_table), toml::Value::Table(layer_table)) => {
            for (key, layer_value) in layer_table {
                match base_table.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, layer_value),
                    None => {
                        base_table.insert(key, layer_value);
                    }
                }
            }
        }
        (base_slot, layer_value) => *base_slot = layer_value,
    }
}

/// Apply `EMON_*` environment overrides. Unparseable values are ignored.
fn apply_env_overrides(config: &mut EmonConfig) {
    if let Ok(url) = std::env::var("EMON_BASE_URL") {
        if !url.trim().is_empty() {
            config.backend.base_url = url;
        }
    }
    if let Some(ms) = env_u64("EMON_TIMEOUT_MS") {
        config.backend.timeout_ms = ms;
    }
    if let Some(ms) = env_u64("EMON_INTERVAL_MS") {
        config.poll.interval_ms = ms;
    }
    if let Ok(format) = std::env::var("EMON_FORMAT") {
        if matches!(format.as_str(), "table" | "json" | "csv") {
            config.output.format = format;
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_product_contract() {
        let config = EmonConfig::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.poll.interval_ms, 5_000);
        assert_eq!(config.output.format, "table");
    }

    #[test]
    fn layer_merge_is_field_granular() {
        let mut config = EmonConfig::default();
        let layer = "[backend]\nbase_url = \"http://energy.example:9000\"\n"
            .parse::<toml::Table>()
            .unwrap();
        merge_layer(&mut config, layer);

        assert_eq!(config.backend.base_url, "http://energy.example:9000");
        // Untouched fields keep the previous layer's values.
        assert_eq!(config.backend.timeout_ms, 10_000);
        assert_eq!(config.poll.interval_ms, 5_000);
    }

    #[test]
    fn unknown_keys_do_not_break_a_layer() {
        let mut config = EmonConfig::default();
        let layer = "[poll]\ninterval_ms = 250\n[future]\nshiny = true\n"
            .parse::<toml::Table>()
            .unwrap();
        merge_layer(&mut config, layer);
        assert_eq!(config.poll.interval_ms, 250);
    }

    #[test]
    fn resolved_config_round_trips_through_toml() {
        let config = EmonConfig::default();
        let text = to_toml_text(&config).unwrap();
        let parsed: EmonConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.backend.timeout_ms, config.backend.timeout_ms);
    }
}
