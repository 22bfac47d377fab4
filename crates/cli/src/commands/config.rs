use std::env;
use std::fs;
use std::path::Path;

use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};
use stayrate_core::config::config_file_path;

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = config_file_path().ok().flatten();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let entries = vec![
        ConfigEntry {
            key: "database.url",
            value: config.database.url.clone(),
            source: source("database.url", &["STAYRATE_DATABASE_URL"]),
        },
        ConfigEntry {
            key: "database.max_connections",
            value: config.database.max_connections.to_string(),
            source: source("database.max_connections", &["STAYRATE_DATABASE_MAX_CONNECTIONS"]),
        },
        ConfigEntry {
            key: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            source: source("database.timeout_secs", &["STAYRATE_DATABASE_TIMEOUT_SECS"]),
        },
        ConfigEntry {
            key: "pricing.cache_ttl_secs",
            value: config.pricing.cache_ttl_secs.to_string(),
            source: source("pricing.cache_ttl_secs", &["STAYRATE_PRICING_CACHE_TTL_SECS"]),
        },
        ConfigEntry {
            key: "pricing.max_stay_nights",
            value: config.pricing.max_stay_nights.to_string(),
            source: source("pricing.max_stay_nights", &["STAYRATE_PRICING_MAX_STAY_NIGHTS"]),
        },
        ConfigEntry {
            key: "pricing.unmapped_bracket",
            value: format!("{:?}", config.pricing.unmapped_bracket),
            source: source("pricing.unmapped_bracket", &["STAYRATE_PRICING_UNMAPPED_BRACKET"]),
        },
        ConfigEntry {
            key: "logging.level",
            value: config.logging.level.clone(),
            source: source("logging.level", &["STAYRATE_LOGGING_LEVEL", "STAYRATE_LOG_LEVEL"]),
        },
        ConfigEntry {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            source: source("logging.format", &["STAYRATE_LOGGING_FORMAT", "STAYRATE_LOG_FORMAT"]),
        },
    ];

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        serde_json::to_value(&entries).ok(),
    )
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
