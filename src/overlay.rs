use glam::Vec2;

use crate::interaction::ScreenRect;

const CONTENT_FRACTION: f32 = 0.8;
const CLOSE_SIZE: f32 = 36.0;
const CLOSE_MARGIN: f32 = 8.0;

/// Whether the card overlay is showing. Opened by a card pick, closed by
/// the close control or a backdrop click; nothing else writes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    visible: bool,
}

impl OverlayState {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn open(&mut self) {
        if !self.visible {
            log::info!("Card overlay opened");
        }
        self.visible = true;
    }

    pub fn dismiss(&mut self) {
        if self.visible {
            log::info!("Card overlay dismissed");
        }
        self.visible = false;
    }
}

/// Part of the overlay under a pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayRegion {
    Close,
    Content,
    Backdrop,
}

/// Screen-space layout of the overlay, shared by hit testing and drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub backdrop: ScreenRect,
    pub content: ScreenRect,
    pub close: ScreenRect,
}

impl OverlayLayout {
    /// Card image centered in `viewport`, at most 80% of it in either
    /// direction, with the close control tucked in its top-right corner.
    /// `pixel_ratio` scales the close control to physical pixels.
    pub fn compute(viewport: ScreenRect, card_aspect: f32, pixel_ratio: f32) -> Self {
        let aspect = if card_aspect.is_finite() && card_aspect > 0.0 {
            card_aspect
        } else {
            1.0
        };
        let max_w = viewport.width * CONTENT_FRACTION;
        let max_h = viewport.height * CONTENT_FRACTION;
        let width = max_w.min(max_h * aspect);
        let height = width / aspect;
        let content = ScreenRect::new(
            viewport.left + (viewport.width - width) * 0.5,
            viewport.top + (viewport.height - height) * 0.5,
            width,
            height,
        );

        let ratio = if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        let size = (CLOSE_SIZE * ratio).min(width * 0.25).min(height * 0.25);
        let margin = (CLOSE_MARGIN * ratio).min(size * 0.25);
        let close = ScreenRect::new(
            content.left + content.width - size - margin,
            content.top + margin,
            size,
            size,
        );

        Self {
            backdrop: viewport,
            content,
            close,
        }
    }

    /// The close control sits on top of the content, so it wins. `None`
    /// outside the viewport.
    pub fn region_at(&self, point: Vec2) -> Option<OverlayRegion> {
        if self.close.contains(point) {
            Some(OverlayRegion::Close)
        } else if self.content.contains(point) {
            Some(OverlayRegion::Content)
        } else if self.backdrop.contains(point) {
            Some(OverlayRegion::Backdrop)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> OverlayLayout {
        OverlayLayout::compute(ScreenRect::new(0.0, 0.0, 1000.0, 500.0), 1.5, 1.0)
    }

    #[test]
    fn content_is_centered_and_bounded() {
        let l = layout();
        // Height bound: 400 tall, 600 wide.
        assert!((l.content.height - 400.0).abs() < 1e-3);
        assert!((l.content.width - 600.0).abs() < 1e-3);
        assert!((l.content.left - 200.0).abs() < 1e-3);
        assert!((l.content.top - 50.0).abs() < 1e-3);
    }

    #[test]
    fn regions_resolve_close_first() {
        let l = layout();
        let close_center = Vec2::new(
            l.close.left + l.close.width * 0.5,
            l.close.top + l.close.height * 0.5,
        );
        assert_eq!(l.region_at(close_center), Some(OverlayRegion::Close));
        assert_eq!(l.region_at(Vec2::new(500.0, 250.0)), Some(OverlayRegion::Content));
        assert_eq!(l.region_at(Vec2::new(10.0, 10.0)), Some(OverlayRegion::Backdrop));
        assert_eq!(l.region_at(Vec2::new(-10.0, 10.0)), None);
    }

    #[test]
    fn close_control_is_inside_content() {
        let l = layout();
        assert!(l.content.contains(Vec2::new(l.close.left, l.close.top)));
        assert!(l.content.contains(Vec2::new(
            l.close.left + l.close.width - 0.01,
            l.close.top + l.close.height - 0.01
        )));
    }

    #[test]
    fn state_toggles() {
        let mut state = OverlayState::default();
        assert!(!state.is_visible());
        state.open();
        state.open();
        assert!(state.is_visible());
        state.dismiss();
        assert!(!state.is_visible());
    }
}
