//! PLA Controller Driver CLI
//!
//! Runs the driver and edits the profile: bindings, thresholds, modes,
//! light color and macros.

use anyhow::Result;
use clap::Parser;
use tracing::info;

// CLI definitions
mod cli;
use cli::{Cli, Commands, MacroCommands};

// Command handlers
mod commands;
use commands::ProfileFile;

use pla_driver::Profile;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config.unwrap_or_else(Profile::default_path);
    info!("Loading profile from {:?}", config_path);
    let mut file = ProfileFile::open(&config_path)?;

    match cli.command {
        None => commands::run::run(file, false, None).await?,
        Some(Commands::Run {
            dry_run,
            serial_port,
        }) => commands::run::run(file, dry_run, serial_port).await?,

        // === Query Commands ===
        Some(Commands::Devices) => commands::query::devices()?,
        Some(Commands::Show { tracker, pg }) => {
            commands::query::show(&file, tracker.as_deref(), pg)?;
        }

        // === Binding Commands ===
        Some(Commands::Bind {
            tracker,
            slot,
            binding,
            pg,
        }) => commands::bindings::bind(&mut file, &tracker, &slot, &binding, pg)?,
        Some(Commands::Unbind { tracker, slot, pg }) => {
            commands::bindings::unbind(&mut file, &tracker, &slot, pg)?;
        }
        Some(Commands::Thresholds {
            tracker,
            short,
            far,
            pg,
        }) => commands::bindings::thresholds(&mut file, &tracker, short, far, pg)?,
        Some(Commands::Mode {
            tracker,
            sequencer,
            diagonals,
            sticky,
            digital,
            pg,
        }) => commands::bindings::mode(
            &mut file, &tracker, sequencer, diagonals, sticky, digital, pg,
        )?,

        // === Light Commands ===
        Some(Commands::Color {
            color,
            brightness,
            enabled,
            serial_port,
        }) => commands::lights::color(
            &mut file,
            color.as_deref(),
            brightness,
            enabled,
            serial_port,
        )?,
        Some(Commands::Pg { pg, serial_port }) => commands::lights::pg(pg, serial_port)?,

        // === Macro Commands ===
        Some(Commands::Macro(command)) => match command {
            MacroCommands::List => commands::macros::list(&file)?,
            MacroCommands::Show { name } => commands::macros::show(&file, &name)?,
            MacroCommands::Fire { name, dry_run } => {
                // Replay sleeps between actions
                tokio::task::block_in_place(|| commands::macros::fire(&file, &name, dry_run))?;
            }
            MacroCommands::Rename { old, new } => {
                commands::macros::rename(&mut file, &old, &new)?;
            }
            MacroCommands::Delete { name } => commands::macros::delete(&mut file, &name)?,
            MacroCommands::Delay { name, mode, ms } => {
                commands::macros::delay(&mut file, &name, mode, ms)?;
            }
            MacroCommands::Record {
                name,
                device,
                force,
            } => tokio::task::block_in_place(|| {
                commands::macros::record(&mut file, &name, &device, force)
            })?,
        },
    }

    Ok(())
}
