//! Axis-state to action mapping
//!
//! Action indexes without sequencing:
//!
//! ```text
//!      7   0   1
//!      6       2
//!      5   4   3
//! ```
//!
//! With vector sequencing the far ("Vector 2") ring wraps the near one:
//!
//! ```text
//!     15      8       9
//!         7   0   1
//!     14  6       2  10
//!         5   4   3
//!     13     12      11
//! ```
//!
//! In diagonal mode each direction owns one bit instead, so a diagonal
//! position presses the two adjacent cardinal actions.

use crate::threshold::AxisState;

/// Number of directional slots on a joystick
pub const DIRECTION_SLOTS: usize = 16;

/// Bit / index of each cardinal direction on the near ring
pub mod direction {
    pub const UP: usize = 0;
    pub const UP_RIGHT: usize = 1;
    pub const RIGHT: usize = 2;
    pub const DOWN_RIGHT: usize = 3;
    pub const DOWN: usize = 4;
    pub const DOWN_LEFT: usize = 5;
    pub const LEFT: usize = 6;
    pub const UP_LEFT: usize = 7;

    /// Offset from a near direction to its far ("Vector 2") counterpart
    pub const FAR_OFFSET: usize = 8;
}

/// Result of mapping one pair of axis states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSelection {
    /// Index mode: at most one action is active
    Index(Option<usize>),
    /// Diagonal mode: every set bit is an active action
    Bits(u16),
}

/// Mode flags that decide how axis states become actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionMapper {
    /// Vector sequencing: far states fire the outer ring
    pub sequencing: bool,
    /// Diagonal mode: directions are independent bits
    pub diagonal: bool,
}

impl ActionMapper {
    pub fn new(sequencing: bool, diagonal: bool) -> Self {
        Self {
            sequencing,
            diagonal,
        }
    }

    /// Map a (horizontal, vertical) state pair according to the mode flags
    pub fn map(&self, hstate: AxisState, vstate: AxisState) -> ActionSelection {
        if self.diagonal {
            ActionSelection::Bits(self.action_bits(hstate, vstate))
        } else {
            ActionSelection::Index(self.action_index(hstate, vstate))
        }
    }

    /// Number of directional slots reachable in the current mode
    pub fn slot_range(&self) -> usize {
        if self.sequencing {
            DIRECTION_SLOTS
        } else {
            DIRECTION_SLOTS / 2
        }
    }

    /// Single action index for non-diagonal mode, `None` when centred
    pub fn action_index(&self, hstate: AxisState, vstate: AxisState) -> Option<usize> {
        use direction::*;

        let far_h = self.sequencing && hstate.abs() == 2;
        let far_v = self.sequencing && vstate.abs() == 2;

        let mut action = match hstate.signum() {
            1 => Some(if far_h { RIGHT + FAR_OFFSET } else { RIGHT }),
            -1 => Some(if far_h { LEFT + FAR_OFFSET } else { LEFT }),
            _ => None,
        };

        const FAR_RIGHT: usize = RIGHT + FAR_OFFSET;
        const FAR_LEFT: usize = LEFT + FAR_OFFSET;

        action = match (vstate.signum(), far_v) {
            (1, true) => Some(match action {
                Some(FAR_RIGHT) => UP_RIGHT + FAR_OFFSET,
                Some(FAR_LEFT) => UP_LEFT + FAR_OFFSET,
                _ => UP + FAR_OFFSET,
            }),
            (1, false) => Some(match action {
                Some(RIGHT) => UP_RIGHT,
                Some(LEFT) => UP_LEFT,
                _ => UP,
            }),
            (-1, true) => Some(match action {
                Some(FAR_RIGHT) => DOWN_RIGHT + FAR_OFFSET,
                Some(FAR_LEFT) => DOWN_LEFT + FAR_OFFSET,
                _ => DOWN + FAR_OFFSET,
            }),
            (-1, false) => Some(match action {
                Some(RIGHT) => DOWN_RIGHT,
                Some(LEFT) => DOWN_LEFT,
                _ => DOWN,
            }),
            _ => action,
        };

        action
    }

    /// Bitmask of active directions for diagonal mode.
    ///
    /// Far bits replace the near bit of the same axis; they never imply it.
    pub fn action_bits(&self, hstate: AxisState, vstate: AxisState) -> u16 {
        use direction::*;

        let bit_for = |near: usize, state: AxisState| -> u16 {
            if self.sequencing && state.abs() == 2 {
                1 << (near + FAR_OFFSET)
            } else {
                1 << near
            }
        };

        let mut bits = 0u16;
        match hstate.signum() {
            1 => bits |= bit_for(RIGHT, hstate),
            -1 => bits |= bit_for(LEFT, hstate),
            _ => {}
        }
        match vstate.signum() {
            1 => bits |= bit_for(UP, vstate),
            -1 => bits |= bit_for(DOWN, vstate),
            _ => {}
        }
        bits
    }
}
