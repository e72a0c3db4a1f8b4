//! Serial light-link protocol
//!
//! Single-byte ASCII commands, some followed by binary arguments:
//!
//! ```text
//! 'i'            handshake, controller answers "PLA\n"
//! 'c' r g b      set light color
//! 'e'            lights on
//! 'd'            lights off
//! 'p'            query selected PG, controller answers one byte
//! 'P' n          select PG n
//! ```

use crate::types::Rgb;

/// Command bytes
pub mod cmd {
    pub const HANDSHAKE: u8 = b'i';
    pub const SET_COLOR: u8 = b'c';
    pub const LIGHTS_ON: u8 = b'e';
    pub const LIGHTS_OFF: u8 = b'd';
    pub const QUERY_PG: u8 = b'p';
    pub const SET_PG: u8 = b'P';
}

/// Expected answer to [`cmd::HANDSHAKE`]
pub const HANDSHAKE_REPLY: &[u8; 4] = b"PLA\n";

/// Serial parameters of the link
pub mod serial {
    pub const BAUD_RATE: u32 = 9600;
    /// Ports probed in order
    pub const PORT_PREFIX: &str = "/dev/ttyACM";
    pub const PORT_COUNT: usize = 10;
}

/// One command to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCommand {
    Handshake,
    SetColor(Rgb),
    LightsOn,
    LightsOff,
    QueryPg,
    SetPg(u8),
}

impl LightCommand {
    /// Wire bytes of this command
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            LightCommand::Handshake => vec![cmd::HANDSHAKE],
            LightCommand::SetColor(c) => vec![cmd::SET_COLOR, c.r, c.g, c.b],
            LightCommand::LightsOn => vec![cmd::LIGHTS_ON],
            LightCommand::LightsOff => vec![cmd::LIGHTS_OFF],
            LightCommand::QueryPg => vec![cmd::QUERY_PG],
            LightCommand::SetPg(pg) => vec![cmd::SET_PG, pg],
        }
    }

    /// Number of reply bytes the controller sends
    pub fn reply_len(&self) -> usize {
        match self {
            LightCommand::Handshake => HANDSHAKE_REPLY.len(),
            LightCommand::QueryPg => 1,
            _ => 0,
        }
    }
}

/// Color bytes actually sent: scaled by `brightness` percent, black when
/// the lights are disabled
pub fn color_bytes(color: Rgb, brightness: u8, enabled: bool) -> Rgb {
    if enabled {
        color.scaled(brightness)
    } else {
        Rgb::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(
            LightCommand::SetColor(Rgb::new(1, 2, 3)).encode(),
            vec![b'c', 1, 2, 3]
        );
        assert_eq!(LightCommand::LightsOn.encode(), b"e".to_vec());
        assert_eq!(LightCommand::LightsOff.encode(), b"d".to_vec());
        assert_eq!(LightCommand::QueryPg.encode(), b"p".to_vec());
        assert_eq!(LightCommand::SetPg(5).encode(), vec![b'P', 5]);
        assert_eq!(LightCommand::Handshake.encode(), b"i".to_vec());
    }

    #[test]
    fn test_reply_len() {
        assert_eq!(LightCommand::Handshake.reply_len(), 4);
        assert_eq!(LightCommand::QueryPg.reply_len(), 1);
        assert_eq!(LightCommand::SetPg(0).reply_len(), 0);
    }

    #[test]
    fn test_color_bytes() {
        assert_eq!(color_bytes(Rgb::WHITE, 20, true), Rgb::new(51, 51, 51));
        assert_eq!(color_bytes(Rgb::WHITE, 100, false), Rgb::default());
    }
}
