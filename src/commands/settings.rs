use crate::services::{gemini, github};
use serde_json::{json, Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_DATA_DIR: &str = "cache";
const MAX_BACKUP_CREDENTIALS: usize = 9;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Effective process configuration.
///
/// Layers, lowest first: built-in defaults, `settings.json` in the data
/// directory, environment variables. Credentials come only from the
/// environment.
#[derive(Clone)]
pub struct Settings {
    pub port: u16,
    pub offline_mode: bool,
    pub data_dir: PathBuf,
    pub github_api_url: String,
    pub gemini_api_url: String,
    pub gemini_model: String,
    pub request_timeout: Duration,
    pub precache_delay: Duration,
    pub github_tokens: Vec<String>,
    pub gemini_keys: Vec<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("port", &self.port)
            .field("offline_mode", &self.offline_mode)
            .field("data_dir", &self.data_dir)
            .field("github_api_url", &self.github_api_url)
            .field("gemini_api_url", &self.gemini_api_url)
            .field("gemini_model", &self.gemini_model)
            .field("request_timeout", &self.request_timeout)
            .field("precache_delay", &self.precache_delay)
            .field("github_tokens", &self.github_tokens.len())
            .field("gemini_keys", &self.gemini_keys.len())
            .finish()
    }
}

impl Settings {
    /// Reads the process environment and the settings file it points at.
    pub fn load() -> Result<Self, SettingsError> {
        let data_dir = std::env::var("GITGRADE_DATA_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let file = read_settings_file(&data_dir.join(SETTINGS_FILE))?;
        Ok(Self::from_sources(data_dir, file, |name| std::env::var(name).ok()))
    }

    /// Builds settings from an already-parsed file document and an
    /// environment lookup.
    pub fn from_sources<F>(data_dir: PathBuf, file: Value, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = migrate_settings(file);
        let env_u64 = |name: &str, current: u64| {
            env(name)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(current)
        };
        let env_string = |name: &str, current: &str| {
            env(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| current.to_string())
        };

        let port = env_u64("PORT", file["port"].as_u64().unwrap_or(8000)).clamp(1, 65_535);
        let offline_mode = env("OFFLINE_MODE")
            .and_then(|value| parse_bool(&value))
            .unwrap_or_else(|| file["offlineMode"].as_bool().unwrap_or(false));
        let timeout_secs =
            env_u64("REQUEST_TIMEOUT_SECS", file["requestTimeoutSecs"].as_u64().unwrap_or(30)).clamp(1, 300);
        let delay_secs = file["precacheDelaySecs"].as_u64().unwrap_or(2).clamp(0, 60);

        Self {
            port: port as u16,
            offline_mode,
            data_dir,
            github_api_url: env_string(
                "GITHUB_API_URL",
                file["githubApiUrl"].as_str().unwrap_or(github::DEFAULT_API_URL),
            ),
            gemini_api_url: env_string(
                "GEMINI_API_URL",
                file["geminiApiUrl"].as_str().unwrap_or(gemini::DEFAULT_API_URL),
            ),
            gemini_model: env_string(
                "GEMINI_MODEL",
                file["geminiModel"].as_str().unwrap_or(gemini::DEFAULT_MODEL),
            ),
            request_timeout: Duration::from_secs(timeout_secs),
            precache_delay: Duration::from_secs(delay_secs),
            github_tokens: credentials_from(&env, "GITHUB_TOKEN"),
            gemini_keys: credentials_from(&env, "GEMINI_API_KEY"),
        }
    }

    pub fn results_path(&self) -> PathBuf {
        self.data_dir.join("results.json")
    }

    pub fn narratives_path(&self) -> PathBuf {
        self.data_dir.join("narratives.json")
    }
}

/// `PREFIX`, then `PREFIX_BACKUP_1` through `PREFIX_BACKUP_9`, skipping blanks.
fn credentials_from<F>(env: &F, prefix: &str) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    std::iter::once(prefix.to_string())
        .chain((1..=MAX_BACKUP_CREDENTIALS).map(|n| format!("{prefix}_BACKUP_{n}")))
        .filter_map(|name| env(&name))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn read_settings_file(path: &Path) -> Result<Value, SettingsError> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str::<Value>(&raw).unwrap_or_else(|err| {
        log::warn!("Ignoring malformed {}: {err}", path.display());
        json!({})
    }))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    deep_merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "port": 8000,
        "offlineMode": false,
        "githubApiUrl": github::DEFAULT_API_URL,
        "geminiApiUrl": gemini::DEFAULT_API_URL,
        "geminiModel": gemini::DEFAULT_MODEL,
        "requestTimeoutSecs": 30,
        "precacheDelaySecs": 2
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "port", 1, 65_535, 8000);
    clamp_u64(obj, "requestTimeoutSecs", 1, 300, 30);
    clamp_u64(obj, "precacheDelaySecs", 0, 60, 2);

    ensure_bool(obj, "offlineMode", false);

    ensure_string(obj, "githubApiUrl", github::DEFAULT_API_URL);
    ensure_string(obj, "geminiApiUrl", gemini::DEFAULT_API_URL);
    ensure_string(obj, "geminiModel", gemini::DEFAULT_MODEL);
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn ensure_bool(map: &mut Map<String, Value>, key: &str, default: bool) {
    let value = map.get(key).and_then(Value::as_bool).unwrap_or(default);
    map.insert(key.to_string(), json!(value));
}

fn ensure_string(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(value));
}
