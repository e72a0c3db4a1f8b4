//! PLA controller driver
//!
//! Ties the transport and input crates together: the TOML profile, the
//! controller layout and the connection/input loops.

pub mod config;
pub mod layout;
pub mod routine;

pub use config::{ColorSettings, PollingSettings, Profile, ProfileError};
pub use layout::{ControllerLayout, StickLayout};
pub use routine::{Controller, ControllerHandle, EditSession, RoutineSettings, RoutineTasks};
