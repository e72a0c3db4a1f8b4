//! In-memory controller for tests and dry runs
//!
//! A [`MockHandle`] is shared between the test and every device or link the
//! [`MockDiscovery`] opens, so a test can move sticks, unplug the
//! controller and inspect the light commands while loops are running.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::InputDevice;
use crate::discovery::DeviceDiscovery;
use crate::error::TransportError;
use crate::protocol::{LightCommand, HANDSHAKE_REPLY};
use crate::serial::LightLink;
use crate::types::{DeviceInfo, PLA_PRODUCT_ID, PLA_VENDOR_ID};

pub const MOCK_AXES: usize = 8;
pub const MOCK_BUTTONS: usize = 16;

#[derive(Debug)]
struct MockState {
    connected: bool,
    link_available: bool,
    axes: [i32; MOCK_AXES],
    buttons: [bool; MOCK_BUTTONS],
    reported_pg: u8,
    commands: Vec<LightCommand>,
    polls: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            connected: true,
            link_available: true,
            axes: [0; MOCK_AXES],
            buttons: [false; MOCK_BUTTONS],
            reported_pg: 0,
            commands: Vec::new(),
            polls: 0,
        }
    }
}

/// Test-side control of a mock controller
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    pub fn set_axis(&self, index: usize, value: i32) {
        if let Some(axis) = self.state.lock().axes.get_mut(index) {
            *axis = value;
        }
    }

    pub fn set_button(&self, index: usize, pressed: bool) {
        if let Some(button) = self.state.lock().buttons.get_mut(index) {
            *button = pressed;
        }
    }

    /// Plug or unplug the controller
    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    /// Whether opening the light link succeeds
    pub fn set_link_available(&self, available: bool) {
        self.state.lock().link_available = available;
    }

    /// PG the controller answers to a PG query
    pub fn set_reported_pg(&self, pg: u8) {
        self.state.lock().reported_pg = pg;
    }

    /// Light commands received so far
    pub fn commands(&self) -> Vec<LightCommand> {
        self.state.lock().commands.clone()
    }

    /// Number of successful polls
    pub fn polls(&self) -> usize {
        self.state.lock().polls
    }
}

pub struct MockController {
    info: DeviceInfo,
    handle: MockHandle,
    axes: [i32; MOCK_AXES],
    buttons: [bool; MOCK_BUTTONS],
}

impl InputDevice for MockController {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn poll(&mut self) -> Result<(), TransportError> {
        let mut state = self.handle.state.lock();
        if !state.connected {
            return Err(TransportError::Disconnected);
        }
        self.axes = state.axes;
        self.buttons = state.buttons;
        state.polls += 1;
        Ok(())
    }

    fn axis(&self, index: usize) -> i32 {
        self.axes.get(index).copied().unwrap_or(0)
    }

    fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    fn axis_count(&self) -> usize {
        MOCK_AXES
    }

    fn button_count(&self) -> usize {
        MOCK_BUTTONS
    }
}

pub struct MockLink {
    handle: MockHandle,
}

impl LightLink for MockLink {
    fn port_name(&self) -> &str {
        "mock"
    }

    fn send_command(&mut self, command: LightCommand) -> Result<(), TransportError> {
        let mut state = self.handle.state.lock();
        if !state.connected {
            return Err(TransportError::Disconnected);
        }
        state.commands.push(command);
        Ok(())
    }

    fn query_command(&mut self, command: LightCommand) -> Result<Vec<u8>, TransportError> {
        self.send_command(command)?;
        let state = self.handle.state.lock();
        Ok(match command {
            LightCommand::Handshake => HANDSHAKE_REPLY.to_vec(),
            LightCommand::QueryPg => vec![state.reported_pg],
            _ => Vec::new(),
        })
    }
}

/// Discovery that finds one mock controller while it is connected
#[derive(Debug, Clone, Default)]
pub struct MockDiscovery {
    handle: MockHandle,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }

    fn info() -> DeviceInfo {
        DeviceInfo {
            vid: PLA_VENDOR_ID,
            pid: PLA_PRODUCT_ID,
            path: PathBuf::from("/dev/input/mock"),
            name: Some("PLA mock controller".into()),
        }
    }
}

impl DeviceDiscovery for MockDiscovery {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        if self.handle.state.lock().connected {
            Ok(vec![Self::info()])
        } else {
            Ok(Vec::new())
        }
    }

    fn open_device(&self, device: &DeviceInfo) -> Result<Box<dyn InputDevice>, TransportError> {
        if !self.handle.state.lock().connected {
            return Err(TransportError::DeviceNotFound(device.path.display().to_string()));
        }
        Ok(Box::new(MockController {
            info: device.clone(),
            handle: self.handle.clone(),
            axes: [0; MOCK_AXES],
            buttons: [false; MOCK_BUTTONS],
        }))
    }

    fn open_link(&self) -> Result<Box<dyn LightLink>, TransportError> {
        let state = self.handle.state.lock();
        if !state.connected || !state.link_available {
            return Err(TransportError::DeviceNotFound("mock link".into()));
        }
        Ok(Box::new(MockLink {
            handle: self.handle.clone(),
        }))
    }
}
