//! Which controller axes and buttons feed which tracker

use serde::{Deserialize, Serialize};

use pla_input::{InputFrame, StickSample, PG_COUNT};
use pla_transport::InputDevice;

/// Axes and button of one stick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickLayout {
    pub x: usize,
    pub y: usize,
    /// Device reports up as negative
    #[serde(default)]
    pub invert_y: bool,
    /// Button pressed by clicking the stick
    #[serde(default)]
    pub button: Option<usize>,
}

impl StickLayout {
    const fn new(x: usize, y: usize, button: usize) -> Self {
        Self {
            x,
            y,
            invert_y: true,
            button: Some(button),
        }
    }

    fn sample(&self, device: &dyn InputDevice) -> StickSample {
        let y = device.axis(self.y);
        StickSample {
            x: device.axis(self.x),
            y: if self.invert_y { y.saturating_neg() } else { y },
            button: self.button.is_some_and(|b| device.button(b)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerLayout {
    #[serde(default = "default_primary")]
    pub primary: StickLayout,
    #[serde(default = "default_left")]
    pub left: StickLayout,
    #[serde(default = "default_right")]
    pub right: StickLayout,
    #[serde(default = "default_steering")]
    pub steering: usize,
    /// Button selecting each PG, PG 0 first
    #[serde(default = "default_pg_buttons")]
    pub pg_buttons: Vec<usize>,
}

fn default_primary() -> StickLayout {
    StickLayout::new(0, 1, 0)
}
fn default_left() -> StickLayout {
    StickLayout::new(3, 4, 1)
}
fn default_right() -> StickLayout {
    StickLayout::new(2, 5, 2)
}
fn default_steering() -> usize {
    6
}
fn default_pg_buttons() -> Vec<usize> {
    (3..3 + PG_COUNT).collect()
}

impl Default for ControllerLayout {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            left: default_left(),
            right: default_right(),
            steering: default_steering(),
            pg_buttons: default_pg_buttons(),
        }
    }
}

impl ControllerLayout {
    /// Build a frame from the device's last poll
    pub fn frame(&self, device: &dyn InputDevice) -> InputFrame {
        let mut pg_buttons = [false; PG_COUNT];
        for (pressed, button) in pg_buttons.iter_mut().zip(&self.pg_buttons) {
            *pressed = device.button(*button);
        }

        InputFrame {
            primary: self.primary.sample(device),
            left: self.left.sample(device),
            right: self.right.sample(device),
            steering: device.axis(self.steering),
            pg_buttons,
        }
    }
}
