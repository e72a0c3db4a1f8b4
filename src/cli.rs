// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pla_driver")]
#[command(author, version, about = "PLA controller driver: sticks, wheel and PG buttons to keys and macros")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Profile path (default: ~/.config/pla/profile.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the driver until interrupted (default)
    #[command(visible_alias = "r")]
    Run {
        /// Log key events instead of injecting them
        #[arg(long)]
        dry_run: bool,
        /// Serial port of the light link instead of probing /dev/ttyACM*
        #[arg(long, value_name = "PORT")]
        serial_port: Option<String>,
    },

    /// List connected controllers
    #[command(visible_aliases = ["list", "ls"])]
    Devices,

    /// Show bindings, thresholds and modes from the profile
    Show {
        /// Tracker to show (left, right, primary, steering); all when omitted
        tracker: Option<String>,
        /// PG (1-8) of the primary stick; all PGs when omitted
        #[arg(long)]
        pg: Option<usize>,
    },

    /// Bind a key or macro to a slot
    Bind {
        /// Tracker: left, right, primary, steering
        tracker: String,
        /// Slot number or name (up, far-up-left, button, left, right, ...)
        slot: String,
        /// Key combination ("Ctrl+Shift+K", "F5") or "macro:NAME"
        binding: String,
        /// PG (1-8) when binding on the primary stick
        #[arg(long)]
        pg: Option<usize>,
    },

    /// Clear a slot
    Unbind {
        tracker: String,
        slot: String,
        #[arg(long)]
        pg: Option<usize>,
    },

    /// Set thresholds of a tracker
    #[command(visible_alias = "th")]
    Thresholds {
        tracker: String,
        /// Short threshold (the wheel only has this one)
        #[arg(long)]
        short: Option<i32>,
        /// Far threshold
        #[arg(long)]
        far: Option<i32>,
        #[arg(long)]
        pg: Option<usize>,
    },

    /// Toggle tracker modes
    Mode {
        tracker: String,
        /// Vector sequencing (near and far rings)
        #[arg(long)]
        sequencer: Option<bool>,
        /// Diagonals press the two adjacent directions
        #[arg(long)]
        diagonals: Option<bool>,
        /// Stick button toggles on each press
        #[arg(long)]
        sticky: Option<bool>,
        /// Wheel sends left/right keys
        #[arg(long)]
        digital: Option<bool>,
        #[arg(long)]
        pg: Option<usize>,
    },

    /// Show or set the light color
    Color {
        /// Color as #rrggbb or r,g,b
        color: Option<String>,
        /// Brightness percent (0-100)
        #[arg(short, long)]
        brightness: Option<u8>,
        /// Turn the lights on (true) or off (false)
        #[arg(long)]
        enabled: Option<bool>,
        /// Serial port of the light link instead of probing
        #[arg(long, value_name = "PORT")]
        serial_port: Option<String>,
    },

    /// Query or select the controller's PG
    Pg {
        /// PG to select (1-8); queries when omitted
        pg: Option<usize>,
        #[arg(long, value_name = "PORT")]
        serial_port: Option<String>,
    },

    /// Macro commands
    #[command(subcommand)]
    Macro(MacroCommands),
}

#[derive(Subcommand)]
pub enum MacroCommands {
    /// List macros
    #[command(visible_alias = "ls")]
    List,

    /// Show the actions of a macro
    Show { name: String },

    /// Play a macro through the virtual keyboard
    Fire {
        name: String,
        /// Log key events instead of injecting them
        #[arg(long)]
        dry_run: bool,
    },

    /// Rename a macro and every binding that uses it
    #[command(visible_alias = "mv")]
    Rename { old: String, new: String },

    /// Delete a macro
    #[command(visible_alias = "rm")]
    Delete { name: String },

    /// Change how a macro's delays are chosen
    Delay {
        name: String,
        #[arg(value_enum)]
        mode: DelayMode,
        /// Delay between actions for fixed mode, in ms
        #[arg(long, default_value = "50")]
        ms: u64,
    },

    /// Record a macro from a keyboard (Esc or Ctrl+C stops)
    Record {
        name: String,
        /// Keyboard event device, e.g. /dev/input/event3
        #[arg(short, long)]
        device: PathBuf,
        /// Replace an existing macro
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DelayMode {
    /// Fire actions back to back
    None,
    /// Same delay after every action
    Fixed,
    /// Keep the recorded timing
    Recorded,
}
