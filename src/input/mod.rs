use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Raw keyboard state for a single frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub keys_held: HashSet<KeyCode>,
    pub keys_pressed: HashSet<KeyCode>,
    pub keys_released: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the edge-triggered sets at end of frame; held keys persist.
    pub fn clear_frame_state(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool { self.keys_held.contains(&key) }
    pub fn is_key_pressed(&self, key: KeyCode) -> bool { self.keys_pressed.contains(&key) }
    pub fn is_key_released(&self, key: KeyCode) -> bool { self.keys_released.contains(&key) }
}
