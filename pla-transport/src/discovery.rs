//! Controller discovery

use tracing::{debug, warn};

use crate::device::{EvdevController, InputDevice};
use crate::error::TransportError;
use crate::serial::{LightLink, SerialLink};
use crate::types::{DeviceInfo, PLA_PRODUCT_ID, PLA_VENDOR_ID};

/// Finds and opens controllers
pub trait DeviceDiscovery: Send + Sync {
    /// List currently connected controllers
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, TransportError>;

    /// Open a controller for polling
    fn open_device(&self, device: &DeviceInfo) -> Result<Box<dyn InputDevice>, TransportError>;

    /// Open the controller's light link
    fn open_link(&self) -> Result<Box<dyn LightLink>, TransportError>;
}

/// Discovery over `/dev/input/event*` and `/dev/ttyACM*`
pub struct EvdevDiscovery {
    /// Known VID/PID pairs to look for
    known_devices: Vec<(u16, u16)>,
    /// Fixed serial port instead of probing
    serial_port: Option<String>,
}

impl Default for EvdevDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl EvdevDiscovery {
    pub fn new() -> Self {
        Self {
            known_devices: vec![(PLA_VENDOR_ID, PLA_PRODUCT_ID)],
            serial_port: None,
        }
    }

    /// Add a VID/PID pair to discover
    pub fn add_device(&mut self, vid: u16, pid: u16) {
        if !self.known_devices.contains(&(vid, pid)) {
            self.known_devices.push((vid, pid));
        }
    }

    /// Use `port` for the light link instead of probing
    pub fn with_serial_port(mut self, port: Option<String>) -> Self {
        self.serial_port = port;
        self
    }

    fn is_known_device(&self, vid: u16, pid: u16) -> bool {
        self.known_devices.contains(&(vid, pid))
    }
}

impl DeviceDiscovery for EvdevDiscovery {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        let mut devices: Vec<DeviceInfo> = evdev::enumerate()
            .filter_map(|(path, device)| {
                let id = device.input_id();
                if !self.is_known_device(id.vendor(), id.product()) {
                    return None;
                }
                // Composite devices expose more nodes; only the one with axes is the stick
                device.supported_absolute_axes()?;

                debug!(
                    "Found controller: VID={:04X} PID={:04X} path={}",
                    id.vendor(),
                    id.product(),
                    path.display()
                );
                Some(DeviceInfo {
                    vid: id.vendor(),
                    pid: id.product(),
                    path,
                    name: device.name().map(str::to_string),
                })
            })
            .collect();
        devices.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(devices)
    }

    fn open_device(&self, device: &DeviceInfo) -> Result<Box<dyn InputDevice>, TransportError> {
        let controller = EvdevController::open(&device.path).map_err(|e| {
            warn!("Failed to open {}: {}", device.path.display(), e);
            e
        })?;
        Ok(Box::new(controller))
    }

    fn open_link(&self) -> Result<Box<dyn LightLink>, TransportError> {
        let link = match &self.serial_port {
            Some(port) => SerialLink::open(port)?,
            None => SerialLink::probe()?,
        };
        Ok(Box::new(link))
    }
}
