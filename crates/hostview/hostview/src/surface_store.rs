//! Synchronized holder of the guest frame buffer and cursor overlay
//!
//! The only state shared between the emulation thread (producer) and the
//! UI thread (renderer). One mutex guards everything; it is held for
//! pointer swaps and surface-to-screen copies, never across a whole frame.

use std::sync::{Mutex, MutexGuard, PoisonError};

use embedded_graphics::prelude::*;
use platform::{CursorImage, Surface};

/// Guest-driven cursor position, in guest display coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MousePosition {
    /// Column of the cursor hot spot
    pub x: i32,
    /// Row of the cursor hot spot
    pub y: i32,
    /// Whether the guest reports the cursor as on-screen
    pub on: bool,
}

/// Borrowed view of everything a paint needs, valid for one locked scope
pub struct Frame<'a> {
    /// Current guest surface
    pub surface: &'a Surface,
    /// Cursor overlay, if the guest installed one
    pub cursor: Option<&'a CursorImage>,
    /// Guest asked for the overlay to be drawn
    pub cursor_visible: bool,
    /// Last reported cursor position
    pub mouse: MousePosition,
}

#[derive(Default)]
struct StoreState {
    surface: Option<Surface>,
    cursor: Option<CursorImage>,
    cursor_visible: bool,
    mouse: MousePosition,
}

/// Frame buffer + cursor overlay behind one exclusive lock
#[derive(Default)]
pub struct SurfaceStore {
    state: Mutex<StoreState>,
}

impl SurfaceStore {
    /// Create an empty store (no surface until the producer installs one)
    pub fn new() -> Self {
        Self::default()
    }

    // A panic inside a scoped closure poisons the mutex. The guarded data is
    // plain pixels with no cross-field invariant a half-finished paint can
    // break, so recover the guard instead of propagating the poison.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the active surface.
    ///
    /// `None` means the producer is not ready yet and is ignored. Returns
    /// `true` when the new surface's dimensions differ from the old one's
    /// (including the first install).
    pub fn update_surface(&self, surface: Option<Surface>) -> bool {
        let Some(surface) = surface else {
            return false;
        };
        let new_size = surface.size();
        let mut state = self.lock();
        let old_size = state.surface.as_ref().map(Surface::size);
        state.surface = Some(surface);
        drop(state);

        tracing::debug!(
            width = new_size.width,
            height = new_size.height,
            "guest surface installed"
        );
        old_size != Some(new_size)
    }

    /// Scoped read access to the surface.
    ///
    /// Returns `None` without calling `f` when no surface is installed. The
    /// lock is released on every exit path, including a panic in `f`.
    pub fn with_surface<R>(&self, f: impl FnOnce(&Surface) -> R) -> Option<R> {
        let state = self.lock();
        state.surface.as_ref().map(f)
    }

    /// Scoped write access to the surface, for in-place pixel updates
    pub fn with_surface_mut<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> Option<R> {
        let mut state = self.lock();
        state.surface.as_mut().map(f)
    }

    /// Scoped read access to the surface together with the cursor state
    pub fn with_frame<R>(&self, f: impl FnOnce(&Frame<'_>) -> R) -> Option<R> {
        let state = self.lock();
        let surface = state.surface.as_ref()?;
        let frame = Frame {
            surface,
            cursor: state.cursor.as_ref(),
            cursor_visible: state.cursor_visible,
            mouse: state.mouse,
        };
        Some(f(&frame))
    }

    /// Replace the cursor overlay
    pub fn set_cursor(&self, image: Option<CursorImage>, visible: bool) {
        let mut state = self.lock();
        state.cursor = image;
        state.cursor_visible = visible;
    }

    /// Record the guest cursor position
    pub fn set_mouse(&self, x: i32, y: i32, on: bool) -> MousePosition {
        let mut state = self.lock();
        let previous = state.mouse;
        state.mouse = MousePosition { x, y, on };
        previous
    }

    /// Last reported guest cursor position
    pub fn mouse(&self) -> MousePosition {
        self.lock().mouse
    }

    /// Size and hot spot of the cursor overlay, if one is installed and visible
    pub fn cursor_extent(&self) -> Option<(Size, Point)> {
        let state = self.lock();
        if !state.cursor_visible {
            return None;
        }
        state.cursor.as_ref().map(|c| (c.size(), c.hot_spot()))
    }

    /// Dimensions of the installed surface
    pub fn dimensions(&self) -> Option<Size> {
        self.lock().surface.as_ref().map(Surface::size)
    }

    /// Whether the producer has installed a surface yet
    pub fn is_ready(&self) -> bool {
        self.lock().surface.is_some()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn empty_store_is_noop() {
        let store = SurfaceStore::new();
        assert!(!store.is_ready());
        assert_eq!(store.with_surface(|_| 1), None);
        assert!(!store.update_surface(None));
        assert!(!store.is_ready());
    }

    #[test]
    fn update_reports_dimension_change() {
        let store = SurfaceStore::new();
        assert!(store.update_surface(Some(Surface::new(640, 480).unwrap())));
        assert!(!store.update_surface(Some(Surface::new(640, 480).unwrap())));
        assert!(store.update_surface(Some(Surface::new(800, 600).unwrap())));
        assert_eq!(store.dimensions(), Some(Size::new(800, 600)));
    }

    #[test]
    fn lock_released_after_panic() {
        let store = SurfaceStore::new();
        store.update_surface(Some(Surface::new(4, 4).unwrap()));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.with_surface(|_| panic!("paint failed"));
        }));
        assert!(result.is_err());

        // Lock is usable again
        assert_eq!(store.with_surface(Surface::width), Some(4));
        assert!(store.update_surface(Some(Surface::new(2, 2).unwrap())));
    }

    #[test]
    fn cursor_extent_follows_visibility() {
        let store = SurfaceStore::new();
        let cursor = CursorImage::from_pixels(8, 8, 1, 2, vec![0; 64]).unwrap();
        store.set_cursor(Some(cursor), false);
        assert_eq!(store.cursor_extent(), None);

        let cursor = CursorImage::from_pixels(8, 8, 1, 2, vec![0; 64]).unwrap();
        store.set_cursor(Some(cursor), true);
        assert_eq!(
            store.cursor_extent(),
            Some((Size::new(8, 8), Point::new(1, 2)))
        );
    }

    #[test]
    fn set_mouse_returns_previous() {
        let store = SurfaceStore::new();
        store.set_mouse(10, 20, true);
        let previous = store.set_mouse(30, 40, true);
        assert_eq!(previous, MousePosition { x: 10, y: 20, on: true });
        assert_eq!(store.mouse().x, 30);
    }

    #[test]
    fn frame_exposes_cursor_state() {
        let store = SurfaceStore::new();
        assert!(store.with_frame(|_| ()).is_none());
        store.update_surface(Some(Surface::new(4, 4).unwrap()));
        store.set_mouse(1, 1, true);
        let seen = store.with_frame(|frame| (frame.cursor.is_none(), frame.mouse.on));
        assert_eq!(seen, Some((true, true)));
    }
}
