use glam::Vec2;

/// Press and release closer than this many pixels apart make a click.
pub const CLICK_SLOP: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// What a pointer event means for the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    Click(Vec2),
    Rotate(Vec2),
    Pan(Vec2),
}

#[derive(Debug, Clone, Copy)]
struct Press {
    button: PointerButton,
    origin: Vec2,
    dragging: bool,
}

/// Splits raw pointer events into clicks and drags. Only one button is
/// tracked at a time; presses of a second button mid-drag are ignored.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    position: Option<Vec2>,
    press: Option<Press>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    pub fn press(&mut self, button: PointerButton) {
        if self.press.is_some() {
            return;
        }
        if let Some(origin) = self.position {
            self.press = Some(Press {
                button,
                origin,
                dragging: false,
            });
        }
    }

    pub fn moved(&mut self, to: Vec2) -> Option<PointerAction> {
        let previous = self.position.replace(to);
        let press = self.press.as_mut()?;

        if !press.dragging {
            if to.distance(press.origin) < CLICK_SLOP {
                return None;
            }
            press.dragging = true;
        }
        let delta = to - previous.unwrap_or(press.origin);
        Some(match press.button {
            PointerButton::Primary => PointerAction::Rotate(delta),
            PointerButton::Secondary => PointerAction::Pan(delta),
        })
    }

    pub fn release(&mut self, button: PointerButton) -> Option<PointerAction> {
        let press = self.press.filter(|p| p.button == button)?;
        self.press = None;
        if press.dragging || button != PointerButton::Primary {
            return None;
        }
        Some(PointerAction::Click(self.position.unwrap_or(press.origin)))
    }

    /// Pointer left the window; an unfinished press is dropped.
    pub fn left(&mut self) {
        self.position = None;
        self.press = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_wiggle_is_still_a_click() {
        let mut t = PointerTracker::new();
        t.moved(Vec2::new(100.0, 100.0));
        t.press(PointerButton::Primary);
        assert_eq!(t.moved(Vec2::new(102.0, 101.0)), None);
        assert_eq!(
            t.release(PointerButton::Primary),
            Some(PointerAction::Click(Vec2::new(102.0, 101.0)))
        );
    }

    #[test]
    fn drag_rotates_and_suppresses_click() {
        let mut t = PointerTracker::new();
        t.moved(Vec2::new(0.0, 0.0));
        t.press(PointerButton::Primary);
        assert_eq!(t.moved(Vec2::new(3.0, 0.0)), None);
        assert_eq!(
            t.moved(Vec2::new(10.0, 0.0)),
            Some(PointerAction::Rotate(Vec2::new(7.0, 0.0)))
        );
        assert_eq!(
            t.moved(Vec2::new(12.0, 1.0)),
            Some(PointerAction::Rotate(Vec2::new(2.0, 1.0)))
        );
        assert_eq!(t.release(PointerButton::Primary), None);
    }

    #[test]
    fn secondary_drag_pans_and_never_clicks() {
        let mut t = PointerTracker::new();
        t.moved(Vec2::ZERO);
        t.press(PointerButton::Secondary);
        assert!(matches!(t.moved(Vec2::new(0.0, 20.0)), Some(PointerAction::Pan(_))));
        assert_eq!(t.release(PointerButton::Secondary), None);

        t.press(PointerButton::Secondary);
        assert_eq!(t.release(PointerButton::Secondary), None);
    }

    #[test]
    fn press_without_position_is_ignored() {
        let mut t = PointerTracker::new();
        t.press(PointerButton::Primary);
        assert_eq!(t.release(PointerButton::Primary), None);
    }
}
