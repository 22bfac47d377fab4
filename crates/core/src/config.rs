use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::calculator::{PriceCalculator, UnmappedBracketPolicy, DEFAULT_MAX_STAY_NIGHTS};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pricing: PricingSettingsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Engine knobs. The prices themselves live in the pricing store.
#[derive(Clone, Debug)]
pub struct PricingSettingsConfig {
    pub cache_ttl_secs: u64,
    pub max_stay_nights: u32,
    pub unmapped_bracket: UnmappedBracketPolicy,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Names a config file that must exist. Without it `stayrate.toml` and
/// `config/stayrate.toml` are tried in that order and may both be absent.
pub const CONFIG_PATH_ENV: &str = "STAYRATE_CONFIG";

const DEFAULT_CONFIG_PATHS: [&str; 2] = ["stayrate.toml", "config/stayrate.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://stayrate.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            pricing: PricingSettingsConfig {
                cache_ttl_secs: 300,
                max_stay_nights: DEFAULT_MAX_STAY_NIGHTS,
                unmapped_bracket: UnmappedBracketPolicy::ZeroRate,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl PricingSettingsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn calculator(&self) -> PriceCalculator {
        PriceCalculator::new(self.max_stay_nights, self.unmapped_bracket)
    }
}

impl AppConfig {
    /// Defaults, then the config file, then `STAYRATE_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = config_file_path()? {
            config.apply_patch(read_patch(&path)?);
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(cache_ttl_secs) = pricing.cache_ttl_secs {
                self.pricing.cache_ttl_secs = cache_ttl_secs;
            }
            if let Some(max_stay_nights) = pricing.max_stay_nights {
                self.pricing.max_stay_nights = max_stay_nights;
            }
            if let Some(unmapped_bracket) = pricing.unmapped_bracket {
                self.pricing.unmapped_bracket = unmapped_bracket;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = read_env("STAYRATE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(max) = env_value("STAYRATE_DATABASE_MAX_CONNECTIONS")? {
            self.database.max_connections = max;
        }
        if let Some(secs) = env_value("STAYRATE_DATABASE_TIMEOUT_SECS")? {
            self.database.timeout_secs = secs;
        }

        if let Some(secs) = env_value("STAYRATE_PRICING_CACHE_TTL_SECS")? {
            self.pricing.cache_ttl_secs = secs;
        }
        if let Some(nights) = env_value("STAYRATE_PRICING_MAX_STAY_NIGHTS")? {
            self.pricing.max_stay_nights = nights;
        }
        if let Some(policy) = env_value("STAYRATE_PRICING_UNMAPPED_BRACKET")? {
            self.pricing.unmapped_bracket = policy;
        }

        if let Some(level) =
            read_env("STAYRATE_LOGGING_LEVEL").or_else(|| read_env("STAYRATE_LOG_LEVEL"))
        {
            self.logging.level = level;
        }
        let format_key = ["STAYRATE_LOGGING_FORMAT", "STAYRATE_LOG_FORMAT"]
            .into_iter()
            .find(|key| read_env(key).is_some());
        if let Some(key) = format_key {
            if let Some(format) = env_value(key)? {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_pricing(&self.pricing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The file `AppConfig::load` reads, if any.
pub fn config_file_path() -> Result<Option<PathBuf>, ConfigError> {
    if let Some(explicit) = read_env(CONFIG_PATH_ENV) {
        let path = PathBuf::from(explicit);
        return if path.exists() { Ok(Some(path)) } else { Err(ConfigError::MissingConfigFile(path)) };
    }

    Ok(DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists()))
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingSettingsConfig) -> Result<(), ConfigError> {
    if pricing.cache_ttl_secs == 0 || pricing.cache_ttl_secs > 86_400 {
        return Err(ConfigError::Validation(
            "pricing.cache_ttl_secs must be in range 1..=86400".to_string(),
        ));
    }

    if pricing.max_stay_nights == 0 || pricing.max_stay_nights > 366 {
        return Err(ConfigError::Validation(
            "pricing.max_stay_nights must be in range 1..=366".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_value<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    read_env(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value })
        })
        .transpose()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    pricing: Option<PricingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    cache_ttl_secs: Option<u64>,
    max_stay_nights: Option<u32>,
    unmapped_bracket: Option<UnmappedBracketPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    use tempfile::TempDir;

    use super::{config_file_path, AppConfig, ConfigError, LogFormat, CONFIG_PATH_ENV};
    use crate::pricing::calculator::UnmappedBracketPolicy;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &Path, body: &str) -> Result<String, String> {
        let path = dir.join("stayrate.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path.display().to_string())
    }

    #[test]
    fn defaults_match_engine_constants() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load().map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.pricing.cache_ttl() == Duration::from_secs(300),
            "default cache ttl should be five minutes",
        )?;
        ensure(config.pricing.max_stay_nights == 60, "default stay cap should be 60 nights")?;
        ensure(
            config.pricing.unmapped_bracket == UnmappedBracketPolicy::ZeroRate,
            "unmapped brackets should price at zero by default",
        )?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            dir.path(),
            r#"
[database]
url = "sqlite://${TEST_STAYRATE_DB_PATH}"

[pricing]
cache_ttl_secs = 60
unmapped_bracket = "reject"
"#,
        )?;

        env::set_var("TEST_STAYRATE_DB_PATH", "/tmp/pousada.db");
        env::set_var(CONFIG_PATH_ENV, &path);

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load().map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite:///tmp/pousada.db",
                "database url should be interpolated from environment",
            )?;
            ensure(config.pricing.cache_ttl_secs == 60, "cache ttl should come from the file")?;
            ensure(
                config.pricing.unmapped_bracket == UnmappedBracketPolicy::Reject,
                "unmapped bracket policy should come from the file",
            )
        })();

        clear_vars(&["TEST_STAYRATE_DB_PATH", CONFIG_PATH_ENV]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STAYRATE_LOG_LEVEL", "warn");
        env::set_var("STAYRATE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load().map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["STAYRATE_LOG_LEVEL", "STAYRATE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn env_wins_over_file_and_file_over_defaults() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            dir.path(),
            r#"
[database]
url = "sqlite://from-file.db"

[pricing]
max_stay_nights = 90
cache_ttl_secs = 120

[logging]
level = "warn"
"#,
        )?;

        env::set_var(CONFIG_PATH_ENV, &path);
        env::set_var("STAYRATE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("STAYRATE_PRICING_MAX_STAY_NIGHTS", "30");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load().map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.database.url == "sqlite://from-env.db", "env database url should win")?;
            ensure(config.logging.level == "warn", "file log level should win over defaults")?;
            ensure(config.pricing.max_stay_nights == 30, "env stay cap should win over file")?;
            ensure(config.pricing.cache_ttl_secs == 120, "file ttl should win over defaults")?;
            ensure(
                config.pricing.calculator().max_stay_nights() == 30,
                "calculator should carry the effective stay cap",
            )
        })();

        clear_vars(&[
            CONFIG_PATH_ENV,
            "STAYRATE_DATABASE_URL",
            "STAYRATE_PRICING_MAX_STAY_NIGHTS",
        ]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STAYRATE_PRICING_CACHE_TTL_SECS", "0");
        let result = match AppConfig::load() {
            Ok(_) => Err("expected validation failure but config load succeeded".to_string()),
            Err(error) => ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message)
                        if message.contains("pricing.cache_ttl_secs")
                ),
                "validation failure should mention pricing.cache_ttl_secs",
            ),
        };

        clear_vars(&["STAYRATE_PRICING_CACHE_TTL_SECS"]);
        result
    }

    #[test]
    fn malformed_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STAYRATE_PRICING_UNMAPPED_BRACKET", "charge_double");
        env::set_var("STAYRATE_DATABASE_TIMEOUT_SECS", "soon");

        let result = match AppConfig::load() {
            Ok(_) => Err("expected invalid override to be rejected".to_string()),
            Err(error) => ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, ref value }
                        if key == "STAYRATE_DATABASE_TIMEOUT_SECS" && value == "soon"
                ),
                "error should name the first offending variable and its value",
            ),
        };

        clear_vars(&["STAYRATE_PRICING_UNMAPPED_BRACKET", "STAYRATE_DATABASE_TIMEOUT_SECS"]);
        result
    }

    #[test]
    fn explicit_config_path_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let absent = dir.path().join("absent.toml");

        env::set_var(CONFIG_PATH_ENV, &absent);
        let lookup = config_file_path();
        let load = AppConfig::load();
        clear_vars(&[CONFIG_PATH_ENV]);

        ensure(
            matches!(lookup, Err(ConfigError::MissingConfigFile(ref path)) if *path == absent),
            "lookup should name the missing file",
        )?;
        ensure(
            matches!(load, Err(ConfigError::MissingConfigFile(_))),
            "load should fail on a missing explicit file",
        )
    }
}
