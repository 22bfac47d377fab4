pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use stayrate_core::config::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "stayrate",
    about = "Stayrate seasonal pricing CLI",
    long_about = "Manage the pricing store and price stays with the seasonal pricing engine.",
    after_help = "Examples:\n  stayrate migrate\n  stayrate seed\n  stayrate quote --check-in 2026-12-20 --check-out 2026-12-27 --guests 6\n  stayrate rates"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Write the built-in default pricing into an empty store")]
    Seed,
    #[command(about = "Price a stay and print the full breakdown")]
    Quote(commands::quote::QuoteArgs),
    #[command(about = "Print the public rate card for every season and guest bracket")]
    Rates,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load() {
        logging::init_logging(&config);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Quote(args) => commands::quote::run(args),
        Command::Rates => commands::rates::run(),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
