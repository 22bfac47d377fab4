pub mod config;
pub mod migrate;
pub mod quote;
pub mod rates;
pub mod seed;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use stayrate_core::config::AppConfig;
use stayrate_core::domain::pricing_config::PricingConfig;
use stayrate_core::errors::ConfigUnavailable;
use stayrate_core::pricing::cache::PricingConfigCache;
use stayrate_core::pricing::source::PricingConfigSource;
use stayrate_db::{connect_with_config, DbPool, SqlPricingConfigSource};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load().map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Stands in for the SQL store when the database cannot be opened, so the
/// cache serves its built-in defaults instead of the command failing.
struct UnreachableStore {
    reason: String,
}

#[async_trait]
impl PricingConfigSource for UnreachableStore {
    async fn fetch_config(&self) -> Result<PricingConfig, ConfigUnavailable> {
        Err(ConfigUnavailable::Store(self.reason.clone()))
    }
}

pub(crate) type SharedCache = Arc<PricingConfigCache<Arc<dyn PricingConfigSource>>>;

/// Builds the read path used by `quote` and `rates`. The pool is returned
/// so the caller can close it once done.
pub(crate) async fn pricing_cache(config: &AppConfig) -> (SharedCache, Option<DbPool>) {
    let (source, pool) = match connect_with_config(&config.database).await {
        Ok(pool) => {
            let source: Arc<dyn PricingConfigSource> =
                Arc::new(SqlPricingConfigSource::new(pool.clone()));
            (source, Some(pool))
        }
        Err(error) => {
            warn!(
                event_name = "cli.db.unreachable",
                error = %error,
                "pricing store could not be opened"
            );
            let source: Arc<dyn PricingConfigSource> =
                Arc::new(UnreachableStore { reason: error.to_string() });
            (source, None)
        }
    };

    let cache = PricingConfigCache::with_ttl(source, config.pricing.cache_ttl());
    (Arc::new(cache), pool)
}
