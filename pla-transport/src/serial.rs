//! Light link over the controller's USB serial port

use std::io::{Read, Write};
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::protocol::{serial, LightCommand, HANDSHAKE_REPLY};
use crate::types::Rgb;

/// How long to wait for a reply byte
pub const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Command channel to the controller's lights and PG state
pub trait LightLink: Send {
    /// Port or identifier of the link
    fn port_name(&self) -> &str;

    /// Send a command without expecting a response
    fn send_command(&mut self, command: LightCommand) -> Result<(), TransportError>;

    /// Send a command and read its fixed-size response
    fn query_command(&mut self, command: LightCommand) -> Result<Vec<u8>, TransportError>;

    fn set_color(&mut self, color: Rgb) -> Result<(), TransportError> {
        self.send_command(LightCommand::SetColor(color))
    }

    fn lights_on(&mut self) -> Result<(), TransportError> {
        self.send_command(LightCommand::LightsOn)
    }

    fn lights_off(&mut self) -> Result<(), TransportError> {
        self.send_command(LightCommand::LightsOff)
    }

    /// PG the controller reports as selected
    fn query_pg(&mut self) -> Result<u8, TransportError> {
        let reply = self.query_command(LightCommand::QueryPg)?;
        reply
            .first()
            .copied()
            .ok_or_else(|| TransportError::InvalidResponse("empty PG reply".into()))
    }

    fn select_pg(&mut self, pg: u8) -> Result<(), TransportError> {
        self.send_command(LightCommand::SetPg(pg))
    }
}

/// Light link on a `/dev/ttyACM*` port
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialLink {
    /// Open `port_name` and verify the controller answers the handshake
    pub fn open(port_name: &str) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, serial::BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::Odd)
            .stop_bits(StopBits::One)
            .timeout(READ_TIMEOUT)
            .open()?;

        let mut link = Self {
            port,
            name: port_name.to_string(),
        };

        let reply = link.query_command(LightCommand::Handshake)?;
        if reply.as_slice() != HANDSHAKE_REPLY {
            return Err(TransportError::Handshake {
                port: port_name.to_string(),
                reply,
            });
        }

        info!("Controller light link on {}", port_name);
        Ok(link)
    }

    /// Probe `/dev/ttyACM0` .. `/dev/ttyACM9` and open the first port that
    /// answers the handshake
    pub fn probe() -> Result<Self, TransportError> {
        for index in 0..serial::PORT_COUNT {
            let name = format!("{}{}", serial::PORT_PREFIX, index);
            match Self::open(&name) {
                Ok(link) => return Ok(link),
                Err(e) => debug!("{}: {}", name, e),
            }
        }

        Err(TransportError::DeviceNotFound(
            "no serial port answered the handshake".into(),
        ))
    }
}

impl LightLink for SerialLink {
    fn port_name(&self) -> &str {
        &self.name
    }

    fn send_command(&mut self, command: LightCommand) -> Result<(), TransportError> {
        self.port.write_all(&command.encode())?;
        self.port.flush()?;
        Ok(())
    }

    fn query_command(&mut self, command: LightCommand) -> Result<Vec<u8>, TransportError> {
        self.send_command(command)?;

        let mut reply = vec![0u8; command.reply_len()];
        self.port.read_exact(&mut reply)?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires a connected controller (run with: cargo test -- --ignored)
    fn test_probe_controller() {
        let mut link = SerialLink::probe().expect("controller on a ttyACM port");
        let pg = link.query_pg().unwrap();
        assert!(pg < 8);
    }
}
