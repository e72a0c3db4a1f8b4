//! Command handlers for the CLI application.
//!
//! This module organizes command handlers by category:
//! - `run`: the driver loop
//! - `query`: read-only commands (devices, show)
//! - `bindings`: profile edits (bind, unbind, thresholds, mode)
//! - `lights`: light link commands (color, pg)
//! - `macros`: macro subcommands

pub mod bindings;
pub mod lights;
pub mod macros;
pub mod query;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tracing::info;

use pla_driver::Profile;
use pla_input::mapper::{direction, DIRECTION_SLOTS};
use pla_input::steering::{LEFT_SLOT, RIGHT_SLOT};
use pla_input::{TrackerId, JOYSTICK_SLOTS, PG_COUNT};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Profile file plus its path, saved back by [`ProfileFile::save`]
pub struct ProfileFile {
    pub path: PathBuf,
    pub profile: Profile,
}

impl ProfileFile {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let profile = Profile::load(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            profile,
        })
    }

    pub fn save(&self) -> CommandResult {
        self.profile
            .save(&self.path)
            .with_context(|| format!("saving {}", self.path.display()))?;
        info!("Saved profile to {}", self.path.display());
        Ok(())
    }
}

/// Tracker named on the command line, with an optional 1-based PG
pub fn parse_target(tracker: &str, pg: Option<usize>) -> anyhow::Result<TrackerId> {
    let target: TrackerId = tracker.parse().map_err(anyhow::Error::msg)?;
    match (target, pg) {
        (TrackerId::Primary(_), Some(pg)) => Ok(TrackerId::Primary(Some(pg_index(pg)?))),
        (_, Some(_)) => bail!("--pg only applies to the primary stick"),
        (target, None) => Ok(target),
    }
}

/// Convert a 1-based PG number to an index
pub fn pg_index(pg: usize) -> anyhow::Result<usize> {
    if pg == 0 || pg > PG_COUNT {
        bail!("PG must be between 1 and {PG_COUNT}");
    }
    Ok(pg - 1)
}

const DIRECTION_NAMES: [&str; 8] = [
    "up",
    "up-right",
    "right",
    "down-right",
    "down",
    "down-left",
    "left",
    "up-left",
];

/// Slot number or name for `target`
pub fn parse_slot(target: TrackerId, slot: &str) -> anyhow::Result<usize> {
    let name = slot.trim().to_ascii_lowercase().replace('_', "-");
    if let Ok(index) = name.parse::<usize>() {
        return Ok(index);
    }

    if target == TrackerId::Steering {
        return match name.as_str() {
            "left" => Ok(LEFT_SLOT),
            "right" => Ok(RIGHT_SLOT),
            _ => bail!("unknown wheel slot: {slot} (use left or right)"),
        };
    }

    if name == "button" {
        return Ok(JOYSTICK_SLOTS - 1);
    }
    let (base, far) = match name.strip_prefix("far-") {
        Some(base) => (base, true),
        None => (name.as_str(), false),
    };
    let index = DIRECTION_NAMES
        .iter()
        .position(|d| *d == base)
        .with_context(|| format!("unknown slot: {slot}"))?;
    Ok(if far { index + direction::FAR_OFFSET } else { index })
}

/// Display name of a slot
pub fn slot_name(target: TrackerId, slot: usize) -> String {
    if target == TrackerId::Steering {
        return match slot {
            LEFT_SLOT => "left".into(),
            RIGHT_SLOT => "right".into(),
            _ => slot.to_string(),
        };
    }
    match slot {
        s if s < direction::FAR_OFFSET => DIRECTION_NAMES[s].to_string(),
        s if s < DIRECTION_SLOTS => format!("far-{}", DIRECTION_NAMES[s - direction::FAR_OFFSET]),
        _ => "button".into(),
    }
}
