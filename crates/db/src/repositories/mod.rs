use thiserror::Error;

use stayrate_core::errors::{AdminError, ConfigUnavailable};

pub mod memory;
pub mod pricing_admin;
pub mod pricing_config;

pub use memory::InMemoryPricingStore;
pub use pricing_admin::SqlPricingAdminRepository;
pub use pricing_config::SqlPricingConfigSource;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for RepositoryError {
    /// A column holding the wrong type is bad data, not an outage.
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::ColumnDecode { .. }) {
            return Self::Decode(error.to_string());
        }
        Self::Database(error)
    }
}

impl From<RepositoryError> for ConfigUnavailable {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(error) => Self::Store(error.to_string()),
            RepositoryError::Decode(message) => Self::Malformed(message),
        }
    }
}

impl From<RepositoryError> for AdminError {
    fn from(error: RepositoryError) -> Self {
        Self::Store(error.to_string())
    }
}
