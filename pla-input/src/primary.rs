//! Primary joystick with eight programmable groups (PGs)
//!
//! Each PG is a full [`JoystickTracker`] with its own bindings and modes.
//! Exactly one PG is live at a time.

use crate::joystick::{JoystickSettings, JoystickTracker};
use crate::runtime::InputRuntime;
use crate::threshold::ThresholdModel;

pub const PG_COUNT: usize = 8;

#[derive(Debug, Clone)]
pub struct PrimaryJoystickTracker {
    groups: [JoystickTracker; PG_COUNT],
    current: usize,
}

impl Default for PrimaryJoystickTracker {
    fn default() -> Self {
        Self::new(ThresholdModel::default())
    }
}

impl PrimaryJoystickTracker {
    pub fn new(thresholds: ThresholdModel) -> Self {
        Self {
            groups: std::array::from_fn(|_| JoystickTracker::new(thresholds)),
            current: 0,
        }
    }

    /// Build from per-PG settings; missing PGs get default settings
    pub fn from_settings(settings: &[JoystickSettings]) -> Self {
        let mut primary = Self::default();
        for (pg, group) in primary.groups.iter_mut().enumerate() {
            if let Some(s) = settings.get(pg) {
                *group = JoystickTracker::from_settings(s);
            }
        }
        primary
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Make PG `pg` live. No-op when out of range or already live.
    ///
    /// Keys held by the outgoing PG are released first.
    pub fn select_pg(&mut self, pg: usize, runtime: &InputRuntime) {
        if pg >= PG_COUNT || pg == self.current {
            return;
        }
        self.groups[self.current].release_all(runtime);
        self.current = pg;
    }

    /// PG `pg`, or the live PG for `None`
    pub fn pg(&self, pg: Option<usize>) -> Option<&JoystickTracker> {
        self.groups.get(pg.unwrap_or(self.current))
    }

    pub fn pg_mut(&mut self, pg: Option<usize>) -> Option<&mut JoystickTracker> {
        self.groups.get_mut(pg.unwrap_or(self.current))
    }

    pub fn groups(&self) -> impl Iterator<Item = &JoystickTracker> {
        self.groups.iter()
    }

    /// Feed the live PG
    pub fn update(&mut self, x: i32, y: i32, button: bool, runtime: &InputRuntime) {
        self.groups[self.current].update(x, y, button, runtime);
    }

    pub fn release_all(&mut self, runtime: &InputRuntime) {
        for group in &mut self.groups {
            group.release_all(runtime);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::RecordingInjector;
    use crate::key::{Key, Modifiers};
    use crate::Bindable;
    use std::sync::Arc;

    #[test]
    fn test_select_releases_outgoing_pg() {
        let injector = Arc::new(RecordingInjector::new());
        let rt = InputRuntime::new(injector.clone());
        let mut primary = PrimaryJoystickTracker::default();
        primary
            .pg_mut(Some(0))
            .unwrap()
            .set_binding(0, Key::new(30, Modifiers::empty()));
        primary
            .pg_mut(Some(3))
            .unwrap()
            .set_binding(0, Key::new(31, Modifiers::empty()));

        primary.update(0, 30000, false, &rt);
        primary.update(0, 30000, false, &rt);
        assert_eq!(injector.held_codes(), vec![30]);

        primary.select_pg(3, &rt);
        assert!(injector.held_codes().is_empty());
        assert_eq!(primary.current(), 3);

        // the new PG has never seen a sample, so the first one is a jump
        primary.update(0, 30000, false, &rt);
        primary.update(0, 30000, false, &rt);
        assert_eq!(injector.held_codes(), vec![31]);
    }

    #[test]
    fn test_select_out_of_range_or_same() {
        let rt = InputRuntime::new(Arc::new(RecordingInjector::new()));
        let mut primary = PrimaryJoystickTracker::default();
        primary.select_pg(8, &rt);
        assert_eq!(primary.current(), 0);
        primary.select_pg(0, &rt);
        assert_eq!(primary.current(), 0);
    }

    #[test]
    fn test_pg_edits_survive_swaps() {
        let rt = InputRuntime::new(Arc::new(RecordingInjector::new()));
        let mut primary = PrimaryJoystickTracker::default();
        primary.select_pg(2, &rt);
        primary.pg_mut(None).unwrap().set_sequencing(true);
        primary.select_pg(5, &rt);
        primary.select_pg(2, &rt);
        assert!(primary.pg(None).unwrap().sequencing());
        assert!(!primary.pg(Some(5)).unwrap().sequencing());
        assert!(primary.pg(Some(9)).is_none());
    }
}
