//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `talent_core` wiring against the configured store.
//! - Run one register/read/replace cycle and print the outcome.

use std::process::ExitCode;
use talent_core::config::init_configured_logging;
use talent_core::{open_store, QueryContext, StoreConfig, TalentService};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("talent_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = StoreConfig::from_env().map_err(|err| err.to_string())?;
    init_configured_logging(&config)?;
    println!("talent_core version={}", talent_core::core_version());

    let mut conn = open_store(&config).map_err(|err| err.to_string())?;
    let ctx = QueryContext::background();
    let mut service = TalentService::new(&mut conn);

    let talent_id = service
        .register_talent(&ctx, "Ada", &["Acme"])
        .map_err(|err| err.to_string())?;
    service
        .replace_experiences(&ctx, talent_id, &["NewCo", "Initech"])
        .map_err(|err| err.to_string())?;
    let profile = service
        .profile(&ctx, talent_id)
        .map_err(|err| err.to_string())?;

    println!(
        "talent id={} name={}",
        profile.talent.id, profile.talent.name
    );
    for experience in &profile.experiences {
        println!(
            "  experience id={} company={} talent_id={}",
            experience.id, experience.company, experience.talent_id
        );
    }
    Ok(())
}
