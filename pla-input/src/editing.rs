//! Working copy of a value with a saved baseline

/// A value being edited next to the last saved version of it
#[derive(Debug, Clone)]
pub struct Editing<T: Clone + PartialEq> {
    saved: T,
    current: T,
}

impl<T: Clone + PartialEq> Editing<T> {
    pub fn new(value: T) -> Self {
        Self {
            saved: value.clone(),
            current: value,
        }
    }

    pub fn get(&self) -> &T {
        &self.current
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.current
    }

    pub fn saved(&self) -> &T {
        &self.saved
    }

    pub fn is_modified(&self) -> bool {
        self.current != self.saved
    }

    /// Make the working copy the new baseline
    pub fn save(&mut self) {
        self.saved = self.current.clone();
    }

    /// Throw away changes since the last save
    pub fn revert(&mut self) {
        self.current = self.saved.clone();
    }
}
