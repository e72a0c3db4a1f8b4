//! Error types for key injection and macro handling

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to create virtual keyboard: {0}")]
    CreateDevice(#[source] std::io::Error),

    #[error("Failed to emit key event: {0}")]
    EmitEvent(#[source] std::io::Error),

    #[error("Key code {0} is outside the virtual keyboard range")]
    UnsupportedCode(i32),

    #[error("Macro not found: {0}")]
    MacroNotFound(String),

    #[error("Macro name already in use: {0}")]
    MacroExists(String),

    #[error("Invalid fixed delay {0} ms (minimum {1} ms)")]
    InvalidDelay(u64, u64),
}
