use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// ── Profile ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// OpenAI-compatible endpoint URL
    pub endpoint: String,
    /// Model identifier
    pub model: String,
    /// Optional API key (sent as Bearer token)
    pub api_key: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen3:14b".to_string(),
            api_key: None,
        }
    }
}

// ── Config file ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Which profile to use when none is specified
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

fn default_profile_name() -> String {
    "default".to_string()
}

impl ConfigFile {
    /// Load from disk, or return a default config if the file doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    /// Write a starter config file to disk (only if it doesn't exist).
    pub fn write_default_if_missing() -> Result<PathBuf> {
        let path = config_path();
        if path.exists() {
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, DEFAULT_CONFIG_TOML)?;
        Ok(path)
    }

    /// Resolve the active profile given an optional override name.
    pub fn resolve_profile(&self, name: Option<&str>) -> Option<&Profile> {
        let key = name.unwrap_or(&self.default_profile);
        self.profiles.get(key)
    }
}

// ── Credential storage ────────────────────────────────────────────────────────

/// Persist the API key into the named profile, creating the profile (and the
/// config file) if needed. This is the single get/set surface for the key —
/// entered live from the chat panel, it survives restarts.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<()> {
    store_api_key_at(&config_path(), profile_name, key)
}

fn store_api_key_at(path: &Path, profile_name: &str, key: &str) -> Result<()> {
    let mut file = ConfigFile::load_from(path)?;
    if file.profiles.is_empty() {
        file.default_profile = profile_name.to_string();
    }
    let profile = file.profiles.entry(profile_name.to_string()).or_default();
    profile.api_key = if key.is_empty() { None } else { Some(key.to_string()) };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = toml::to_string_pretty(&file)
        .context("Failed to serialise config")?;
    fs::write(path, raw)
        .with_context(|| format!("Failed to write config file at {}", path.display()))?;
    Ok(())
}

// ── Resolved runtime config (after merging file + CLI overrides) ──────────────

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Profile name that was resolved (for display)
    pub profile_name: String,
}

impl ResolvedConfig {
    /// Merge config file profile with CLI overrides.
    /// Priority: CLI args > env vars (handled by clap) > config file profile > built-in defaults
    pub fn resolve(
        file: &ConfigFile,
        profile_override: Option<&str>,
        endpoint_override: Option<&str>,
        model_override: Option<&str>,
        api_key_override: Option<&str>,
    ) -> Self {
        let profile_name = profile_override
            .unwrap_or(&file.default_profile)
            .to_string();

        let base = file
            .resolve_profile(profile_override)
            .cloned()
            .unwrap_or_default();

        Self {
            endpoint: endpoint_override
                .map(str::to_string)
                .unwrap_or(base.endpoint),
            model: model_override
                .map(str::to_string)
                .unwrap_or(base.model),
            api_key: api_key_override
                .map(str::to_string)
                .or(base.api_key),
            profile_name,
        }
    }
}

// ── Paths ─────────────────────────────────────────────────────────────────────

pub fn config_path() -> PathBuf {
    dirs_config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marky")
        .join("config.toml")
}

fn dirs_config_dir() -> Option<PathBuf> {
    // XDG_CONFIG_HOME or ~/.config on Linux/macOS, %APPDATA% on Windows
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
}

// ── Default config template written on first run ──────────────────────────────

const DEFAULT_CONFIG_TOML: &str = r#"# marky configuration
# Run `marky --init` to regenerate this file.

default_profile = "local"

# ── Local Ollama (default) ────────────────────────────────────────────────────
[profiles.local]
endpoint = "http://localhost:11434"
model    = "qwen3:14b"
# api_key is not needed for Ollama

# ── OpenAI ───────────────────────────────────────────────────────────────────
# [profiles.openai]
# endpoint = "https://api.openai.com/v1"
# model    = "gpt-4o"
# api_key  = "sk-..."

# ── OpenRouter ────────────────────────────────────────────────────────────────
# [profiles.openrouter]
# endpoint = "https://openrouter.ai/api/v1"
# model    = "qwen/qwen-2.5-coder-32b-instruct"
# api_key  = "sk-or-..."
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses() {
        let file: ConfigFile = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(file.default_profile, "local");
        let local = file.profiles.get("local").unwrap();
        assert_eq!(local.model, "qwen3:14b");
        assert!(local.api_key.is_none());
    }

    #[test]
    fn cli_overrides_beat_profile_values() {
        let mut file = ConfigFile::default();
        file.profiles.insert(
            "work".to_string(),
            Profile {
                endpoint: "https://example.test/v1".to_string(),
                model: "base-model".to_string(),
                api_key: Some("from-file".to_string()),
            },
        );
        let resolved = ResolvedConfig::resolve(&file, Some("work"), None, Some("better-model"), None);
        assert_eq!(resolved.endpoint, "https://example.test/v1");
        assert_eq!(resolved.model, "better-model");
        assert_eq!(resolved.api_key.as_deref(), Some("from-file"));
        assert_eq!(resolved.profile_name, "work");
    }

    #[test]
    fn missing_profile_falls_back_to_defaults() {
        let file = ConfigFile::default();
        let resolved = ResolvedConfig::resolve(&file, Some("nope"), None, None, None);
        assert_eq!(resolved.endpoint, "http://localhost:11434");
    }

    #[test]
    fn api_key_round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        store_api_key_at(&path, "local", "sk-test-123").unwrap();
        let file = ConfigFile::load_from(&path).unwrap();
        assert_eq!(
            file.profiles.get("local").unwrap().api_key.as_deref(),
            Some("sk-test-123")
        );

        // Empty key clears the stored value
        store_api_key_at(&path, "local", "").unwrap();
        let file = ConfigFile::load_from(&path).unwrap();
        assert!(file.profiles.get("local").unwrap().api_key.is_none());
    }
}
