pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use config::{AppConfig, ConfigError};
pub use domain::breakdown::{NightCharge, PriceBreakdown, SeasonSubtotal, StayRequest};
pub use domain::pricing_config::PricingConfig;
pub use domain::season::{BracketRate, GuestBracket, MonthSet, Season, SeasonId};
pub use errors::{AdminError, ConfigUnavailable, DomainError, PricingError};
pub use pricing::admin::{PricingAdmin, PricingConfigWriter, PricingSettings};
pub use pricing::cache::{ConfigSnapshot, PricingConfigCache, SnapshotOrigin};
pub use pricing::calculator::{PriceCalculator, StayPricer, UnmappedBracketPolicy};
pub use pricing::source::{PricingConfigSource, PricingRows};
pub use pricing::QuoteService;
