use crate::commands::{build_runtime, load_config, CommandResult};
use stayrate_db::{connect_with_config, migrations, DefaultPricingSeed, SeedResult};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded = DefaultPricingSeed::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8));

        pool.close().await;
        seeded
    });

    match result {
        Ok(seeded) => CommandResult::success_with_data(
            "seed",
            seed_message(&seeded),
            serde_json::to_value(&seeded).ok(),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(seeded: &SeedResult) -> String {
    if seeded.applied {
        format!(
            "seeded default pricing: {} settings, {} seasons, {} rules",
            seeded.settings_written, seeded.seasons_written, seeded.rules_written
        )
    } else {
        "pricing store already holds seasons; nothing written".to_string()
    }
}
