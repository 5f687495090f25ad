//! Semantic input events

/// Semantic input events generated from raw state changes
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Key went down this frame
    KeyPress { key: KeyCode },

    /// Key went up this frame
    KeyRelease { key: KeyCode },

    /// Cursor moved, or was seen for the first time
    MouseMove {
        /// Window position in physical pixels
        pos: [f32; 2],
    },

    /// Raw pointer motion this frame, unbounded by the window
    MouseMotion {
        /// Device units, y pointing down
        delta: [f32; 2],
    },

    /// Vertical wheel offset, in lines
    Scroll { delta: f32 },
}

/// Keys the scene reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyCode {
    Escape,
    Space,
    F1,

    W,
    A,
    S,
    D,
    Q,
    E,

    Other,
}

/// Convert from winit key code
impl From<winit::keyboard::KeyCode> for KeyCode {
    fn from(key: winit::keyboard::KeyCode) -> Self {
        use winit::keyboard::KeyCode as WK;
        match key {
            WK::Escape => Self::Escape,
            WK::Space => Self::Space,
            WK::F1 => Self::F1,

            WK::KeyW => Self::W,
            WK::KeyA => Self::A,
            WK::KeyS => Self::S,
            WK::KeyD => Self::D,
            WK::KeyQ => Self::Q,
            WK::KeyE => Self::E,

            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winit_key_mapping() {
        assert_eq!(KeyCode::from(winit::keyboard::KeyCode::KeyQ), KeyCode::Q);
        assert_eq!(KeyCode::from(winit::keyboard::KeyCode::F1), KeyCode::F1);
        assert_eq!(KeyCode::from(winit::keyboard::KeyCode::KeyZ), KeyCode::Other);
    }
}
