//! Common types for the transport layer

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// SparkFun vendor ID used by the controller's USB stack
pub const PLA_VENDOR_ID: u16 = 0x1B4F;
/// Product ID of the PLA controller
pub const PLA_PRODUCT_ID: u16 = 0x9204;

/// Identification of a discovered controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// Event node, e.g. `/dev/input/event7`
    pub path: PathBuf,
    /// Product name if available
    pub name: Option<String>,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} {} ({})",
            self.vid,
            self.pid,
            self.name.as_deref().unwrap_or("unknown"),
            self.path.display()
        )
    }
}

/// 24-bit light color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale each channel by `percent` (0-100)
    pub fn scaled(self, percent: u8) -> Rgb {
        let percent = u16::from(percent.min(100));
        let scale = |c: u8| (u16::from(c) * percent / 100) as u8;
        Rgb::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::str::FromStr for Rgb {
    type Err = String;

    /// Parse `#rrggbb`, `rrggbb` or `r,g,b`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((r, rest)) = s.split_once(',') {
            let (g, b) = rest
                .split_once(',')
                .ok_or_else(|| format!("invalid color: {s}"))?;
            let channel = |v: &str| {
                v.trim()
                    .parse::<u8>()
                    .map_err(|_| format!("invalid color channel: {v}"))
            };
            return Ok(Rgb::new(channel(r)?, channel(g)?, channel(b)?));
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            return Err(format!("invalid color: {s}"));
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| format!("invalid color: {s}"))?;
        Ok(Rgb::new((value >> 16) as u8, (value >> 8) as u8, value as u8))
    }
}
