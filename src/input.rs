//! Keyboard state tracking and debounced toggles.
//!
//! The window loop records raw key transitions into a [`KeyStates`]
//! set; the simulation polls that set once per accepted frame.
//! Continuous actions (dragging a value) read held keys directly,
//! while mode flips go through [`KeyToggle`] so a key held across
//! many 100fps frames does not flip its flag on every one of them.

use std::collections::HashSet;

use winit::keyboard::KeyCode;

/// Physical key assignments.
pub mod bindings {
    use winit::keyboard::KeyCode;

    pub const HEIGHT: KeyCode = KeyCode::KeyH;
    pub const AUTO: KeyCode = KeyCode::KeyA;
    pub const EDGE_UP: KeyCode = KeyCode::KeyU;
    pub const EDGE_DOWN: KeyCode = KeyCode::KeyD;
    pub const EDGE_LEFT: KeyCode = KeyCode::KeyL;
    pub const EDGE_RIGHT: KeyCode = KeyCode::KeyR;
    pub const SAMPLE: KeyCode = KeyCode::KeyP;
    pub const QUIT: KeyCode = KeyCode::Escape;
}

/// Set of currently held physical keys.
#[derive(Debug, Clone, Default)]
pub struct KeyStates {
    held: HashSet<KeyCode>,
}

impl KeyStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: KeyCode) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.held.remove(&key);
    }

    pub fn held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn arrow_up(&self) -> bool {
        self.held(KeyCode::ArrowUp)
    }

    pub fn arrow_down(&self) -> bool {
        self.held(KeyCode::ArrowDown)
    }

    pub fn arrow_left(&self) -> bool {
        self.held(KeyCode::ArrowLeft)
    }

    pub fn arrow_right(&self) -> bool {
        self.held(KeyCode::ArrowRight)
    }

    /// Dragging-speed increase ('+' on either keyboard half)
    pub fn accelerate(&self) -> bool {
        self.held(KeyCode::Equal) || self.held(KeyCode::NumpadAdd)
    }

    /// Dragging-speed decrease ('-' on either keyboard half)
    pub fn decelerate(&self) -> bool {
        self.held(KeyCode::Minus) || self.held(KeyCode::NumpadSubtract)
    }
}

/// Debounced toggle bound to one key.
///
/// Polled once per frame. The bound flag flips when the key is seen
/// held and at least the debounce window has passed since this
/// toggle's previous flip; detections inside the window are dropped,
/// so a key held continuously flips once per window rather than once
/// per frame. Each toggle keeps its own timestamp.
#[derive(Debug, Clone)]
pub struct KeyToggle {
    key: KeyCode,
    window_ms: u64,
    last_flip_ms: Option<u64>,
}

impl KeyToggle {
    pub fn new(key: KeyCode, window_ms: u64) -> Self {
        Self {
            key,
            window_ms,
            last_flip_ms: None,
        }
    }

    /// Flip `flag` if the key is held and the debounce window allows it.
    pub fn poll(&mut self, keys: &KeyStates, now_ms: u64, flag: &mut bool) {
        if !keys.held(self.key) {
            return;
        }
        if let Some(last) = self.last_flip_ms {
            if now_ms - last < self.window_ms {
                return;
            }
        }
        *flag = !*flag;
        self.last_flip_ms = Some(now_ms);
    }
}
