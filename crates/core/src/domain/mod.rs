pub mod breakdown;
pub mod pricing_config;
pub mod season;
