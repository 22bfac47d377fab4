pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod seed;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use repositories::{
    InMemoryPricingStore, RepositoryError, SqlPricingAdminRepository, SqlPricingConfigSource,
};
pub use seed::{DefaultPricingSeed, SeedResult};
