//! Input state shared between the event callbacks and the frame update.

use crate::Vec2;

/// Keys that drive camera movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Back,
    Left,
    Right,
}

const KEY_COUNT: usize = 4;

impl MoveKey {
    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// Key-down table plus mouse motion accumulated since the last update.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputState {
    key_down: [bool; KEY_COUNT],
    mouse_delta: Vec2,
    unfocused: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set_key(&mut self, key: MoveKey, down: bool) {
        self.key_down[key.slot()] = down;
    }

    #[inline]
    pub fn is_down(&self, key: MoveKey) -> bool {
        self.key_down[key.slot()]
    }

    /// Add raw pointer motion (device units). Ignored while unfocused.
    #[inline]
    pub fn add_mouse_delta(&mut self, dx: f32, dy: f32) {
        if self.unfocused {
            return;
        }
        self.mouse_delta += Vec2::new(dx, dy);
    }

    #[inline]
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Return the accumulated motion and reset it to zero.
    #[inline]
    pub fn take_mouse_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.mouse_delta)
    }

    /// Movement axis: `x` strafes (+1 left), `y` walks (+1 forward).
    /// Forward wins over back and left wins over right.
    pub fn move_axis(&self) -> Vec2 {
        let y = if self.is_down(MoveKey::Forward) {
            1.0
        } else if self.is_down(MoveKey::Back) {
            -1.0
        } else {
            0.0
        };
        let x = if self.is_down(MoveKey::Left) {
            1.0
        } else if self.is_down(MoveKey::Right) {
            -1.0
        } else {
            0.0
        };
        Vec2::new(x, y)
    }

    /// Release every key.
    pub fn release_all(&mut self) {
        self.key_down = [false; KEY_COUNT];
    }

    /// Losing focus releases every key and drops pending motion; motion
    /// stays ignored until focus returns.
    pub fn set_focused(&mut self, focused: bool) {
        self.unfocused = !focused;
        if !focused {
            self.release_all();
            self.mouse_delta = Vec2::ZERO;
        }
    }
}
