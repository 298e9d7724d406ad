//! Mouse report decoding: SGR (1006) and legacy X10, with press/drag state.

use crate::events::{
    Modifiers, MouseButton, MouseInput, MouseInputKind, ScrollDirection, ScrollInfo,
};

/// Tracks the held button so motion reports become drags and releases get
/// their button attached. Reset when mouse reporting is disabled or the
/// terminal resizes.
#[derive(Debug, Default)]
pub(crate) struct MouseState {
    pressed: Option<MouseButton>,
}

impl MouseState {
    /// Forget any held button.
    pub(crate) fn reset(&mut self) {
        self.pressed = None;
    }

    /// Decode an SGR report's decoded fields into an input event.
    pub(crate) fn sgr(&mut self, cb: u32, x: u16, y: u16, release: bool) -> Option<MouseInput> {
        let modifiers = button_modifiers(cb);

        if cb & 64 != 0 {
            // Scroll: 64 = up, 65 = down.
            let direction = if cb & 1 == 0 {
                ScrollDirection::Up
            } else {
                ScrollDirection::Down
            };
            return Some(MouseInput {
                kind: MouseInputKind::Scroll,
                button: None,
                x,
                y,
                modifiers,
                scroll: Some(ScrollInfo {
                    direction,
                    delta: 1,
                }),
            });
        }

        let button = decode_button(cb & 0b11);
        let motion = cb & 32 != 0;

        let (kind, button) = if release {
            let b = button.or(self.pressed);
            self.pressed = None;
            (MouseInputKind::Up, b)
        } else if motion {
            match self.pressed {
                Some(held) => (MouseInputKind::Drag, Some(held)),
                None => (MouseInputKind::Move, None),
            }
        } else {
            self.pressed = button;
            (MouseInputKind::Down, button)
        };

        Some(MouseInput {
            kind,
            button,
            x,
            y,
            modifiers,
            scroll: None,
        })
    }

    /// Decode a classic X10 report (`ESC [ M Cb Cx Cy`).
    pub(crate) fn x10(&mut self, cb: u8, cx: u8, cy: u8) -> Option<MouseInput> {
        let cb = u32::from(cb.wrapping_sub(32));
        let x = u16::from(cx.saturating_sub(33));
        let y = u16::from(cy.saturating_sub(33));
        // X10 encodes release as button code 3.
        if cb & 0b11 == 3 && cb & 64 == 0 {
            let b = self.pressed;
            self.pressed = None;
            return Some(MouseInput {
                kind: MouseInputKind::Up,
                button: b,
                x,
                y,
                modifiers: button_modifiers(cb),
                scroll: None,
            });
        }
        self.sgr(cb, x, y, false)
    }
}

fn decode_button(bits: u32) -> Option<MouseButton> {
    match bits {
        0 => Some(MouseButton::Left),
        1 => Some(MouseButton::Middle),
        2 => Some(MouseButton::Right),
        _ => None,
    }
}

fn button_modifiers(cb: u32) -> Modifiers {
    let mut mods = Modifiers::empty();
    if cb & 4 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if cb & 8 != 0 {
        mods |= Modifiers::ALT;
    }
    if cb & 16 != 0 {
        mods |= Modifiers::CTRL;
    }
    mods
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_then_motion_is_drag() {
        let mut st = MouseState::default();
        let down = st.sgr(0, 3, 4, false);
        assert!(down.is_some_and(
            |e| e.kind == MouseInputKind::Down && e.button == Some(MouseButton::Left)
        ));
        let drag = st.sgr(32, 5, 6, false);
        assert!(drag.is_some_and(
            |e| e.kind == MouseInputKind::Drag && e.button == Some(MouseButton::Left)
        ));
    }

    #[test]
    fn motion_without_press_is_move() {
        let mut st = MouseState::default();
        let mv = st.sgr(35, 1, 1, false);
        assert!(mv.is_some_and(|e| e.kind == MouseInputKind::Move && e.button.is_none()));
    }

    #[test]
    fn release_carries_pressed_button() {
        let mut st = MouseState::default();
        let _ = st.sgr(2, 0, 0, false); // right down
        let up = st.sgr(3, 0, 0, true);
        assert!(up.is_some_and(
            |e| e.kind == MouseInputKind::Up && e.button == Some(MouseButton::Right)
        ));
    }

    #[test]
    fn scroll_directions() {
        let mut st = MouseState::default();
        let up = st.sgr(64, 2, 2, false);
        assert!(up.is_some_and(|e| e.kind == MouseInputKind::Scroll
            && e.scroll.is_some_and(|s| s.direction == ScrollDirection::Up)));
        let down = st.sgr(65, 2, 2, false);
        assert!(down.is_some_and(|e| e
            .scroll
            .is_some_and(|s| s.direction == ScrollDirection::Down)));
    }

    #[test]
    fn modifiers_from_button_bits() {
        let mut st = MouseState::default();
        let ev = st.sgr(16, 0, 0, false); // ctrl + left
        assert!(ev.is_some_and(|e| e.modifiers.contains(Modifiers::CTRL)));
    }

    #[test]
    fn reset_clears_held_button() {
        let mut st = MouseState::default();
        let _ = st.sgr(0, 0, 0, false);
        st.reset();
        let mv = st.sgr(32, 1, 1, false);
        assert!(mv.is_some_and(|e| e.kind == MouseInputKind::Move));
    }

    #[test]
    fn x10_coordinates_are_offset() {
        let mut st = MouseState::default();
        // Cb=32 (left press), Cx=33+5, Cy=33+2
        let ev = st.x10(32, 38, 35);
        assert!(ev.is_some_and(|e| e.kind == MouseInputKind::Down && e.x == 5 && e.y == 2));
    }

    #[test]
    fn x10_release() {
        let mut st = MouseState::default();
        let _ = st.x10(32, 33, 33);
        let up = st.x10(35, 33, 33);
        assert!(up.is_some_and(
            |e| e.kind == MouseInputKind::Up && e.button == Some(MouseButton::Left)
        ));
    }
}
