//! Transport error types

use thiserror::Error;

/// Errors that can occur while talking to the controller
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("Communication timeout")]
    Timeout,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Handshake failed on {port}: got {reply:?}")]
    Handshake { port: String, reply: Vec<u8> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => TransportError::PermissionDenied(e.to_string()),
            std::io::ErrorKind::TimedOut => TransportError::Timeout,
            // ENODEV: the device node went away under us
            _ if e.raw_os_error() == Some(19) => TransportError::Disconnected,
            _ => TransportError::Io(e),
        }
    }
}

impl From<serialport::Error> for TransportError {
    fn from(e: serialport::Error) -> Self {
        match e.kind() {
            serialport::ErrorKind::NoDevice => TransportError::DeviceNotFound(e.to_string()),
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                TransportError::PermissionDenied(e.to_string())
            }
            _ => TransportError::Serial(e.to_string()),
        }
    }
}
