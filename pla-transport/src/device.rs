//! Controller polling through evdev
//!
//! The kernel's joystick driver exposes the controller as an event device.
//! Polling reads the current absolute-axis and key state with ioctls, so a
//! poll never blocks and always returns the latest values.

use std::path::Path;

use evdev::{AbsoluteAxisType, Device, Key};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::types::DeviceInfo;

/// Normalized axis range
pub const AXIS_MAX: i32 = 32767;

/// First key code that is a button rather than a keyboard key
const BTN_MISC: u16 = 0x100;

/// A polled controller
pub trait InputDevice: Send {
    fn info(&self) -> &DeviceInfo;

    /// Refresh the axis and button snapshot
    fn poll(&mut self) -> Result<(), TransportError>;

    /// Axis `index` from the last poll, in `-32767..=32767`; 0 when absent
    fn axis(&self, index: usize) -> i32;

    /// Button `index` from the last poll; false when absent
    fn button(&self, index: usize) -> bool;

    fn axis_count(&self) -> usize;

    fn button_count(&self) -> usize;
}

/// Map `value` from `min..=max` onto `-32767..=32767`
pub fn normalize_axis(value: i32, min: i32, max: i32) -> i32 {
    if max <= min {
        return 0;
    }
    let span = i64::from(max) - i64::from(min);
    let offset = i64::from(value.clamp(min, max)) - i64::from(min);
    let scaled = offset * (2 * i64::from(AXIS_MAX)) / span - i64::from(AXIS_MAX);
    scaled as i32
}

/// Controller opened as `/dev/input/event*`
pub struct EvdevController {
    device: Device,
    info: DeviceInfo,
    /// Supported absolute axes in code order; axis `i` is `axes[i]`
    axes: Vec<AbsoluteAxisType>,
    /// Supported buttons in code order; button `i` is `buttons[i]`
    buttons: Vec<Key>,
    axis_values: Vec<i32>,
    button_values: Vec<bool>,
}

impl EvdevController {
    pub fn open(path: &Path) -> Result<Self, TransportError> {
        let device = Device::open(path)?;
        let id = device.input_id();
        let info = DeviceInfo {
            vid: id.vendor(),
            pid: id.product(),
            path: path.to_path_buf(),
            name: device.name().map(str::to_string),
        };
        Ok(Self::from_device(device, info))
    }

    pub(crate) fn from_device(device: Device, info: DeviceInfo) -> Self {
        let axes: Vec<AbsoluteAxisType> = device
            .supported_absolute_axes()
            .map(|set| set.iter().collect())
            .unwrap_or_default();
        let buttons: Vec<Key> = device
            .supported_keys()
            .map(|set| set.iter().filter(|k| k.code() >= BTN_MISC).collect())
            .unwrap_or_default();

        info!(
            "Opened controller {} ({} axes, {} buttons)",
            info,
            axes.len(),
            buttons.len()
        );
        debug!("axes: {:?}", axes);
        debug!("buttons: {:?}", buttons);

        Self {
            device,
            info,
            axis_values: vec![0; axes.len()],
            button_values: vec![false; buttons.len()],
            axes,
            buttons,
        }
    }
}

impl InputDevice for EvdevController {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn poll(&mut self) -> Result<(), TransportError> {
        let abs = self.device.get_abs_state()?;
        for (value, axis) in self.axis_values.iter_mut().zip(&self.axes) {
            let state = &abs[axis.0 as usize];
            *value = normalize_axis(state.value, state.minimum, state.maximum);
        }

        let keys = self.device.get_key_state()?;
        for (value, button) in self.button_values.iter_mut().zip(&self.buttons) {
            *value = keys.contains(*button);
        }
        Ok(())
    }

    fn axis(&self, index: usize) -> i32 {
        self.axis_values.get(index).copied().unwrap_or(0)
    }

    fn button(&self, index: usize) -> bool {
        self.button_values.get(index).copied().unwrap_or(false)
    }

    fn axis_count(&self) -> usize {
        self.axes.len()
    }

    fn button_count(&self) -> usize {
        self.buttons.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_range() {
        assert_eq!(normalize_axis(-32768, -32768, 32767), -32767);
        assert_eq!(normalize_axis(32767, -32768, 32767), 32767);
        assert_eq!(normalize_axis(0, 0, 1023), -32767);
        assert_eq!(normalize_axis(1023, 0, 1023), 32767);
    }

    #[test]
    fn test_normalize_center_and_clamp() {
        assert_eq!(normalize_axis(128, 0, 256), 0);
        assert_eq!(normalize_axis(5000, 0, 1023), 32767);
        assert_eq!(normalize_axis(-5, 0, 1023), -32767);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        assert_eq!(normalize_axis(10, 5, 5), 0);
    }
}
