//! Window and view sizing
//!
//! Pure functions over guest dimensions and zoom / full-screen mode. Nothing
//! here touches the window system or the renderer; callers feed the results
//! to [`Renderer`](crate::renderer::Renderer) and the host window.
//!
//! Sizes returned by [`GeometryEngine::resize_window`] are in host *logical*
//! pixels (what the window system is asked for). Rectangles returned by
//! [`GeometryEngine::content_rect`] are in *physical* pixels of the drawing
//! buffer.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Initial guest resolution before the producer reports a mode
pub const DEFAULT_GUEST_SIZE: Size = Size::new(640, 480);

/// Guest screen dimensions.
///
/// Width and height only change together, so no reader ever sees a
/// half-updated aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    width: u32,
    height: u32,
}

impl ScreenGeometry {
    /// Create with the given dimensions (each clamped to at least 1)
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Replace both dimensions at once. Returns `true` when they changed.
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> bool {
        let next = Self::new(width, height);
        let changed = next != *self;
        *self = next;
        changed
    }

    /// Guest width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Guest height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Guest dimensions as a `Size`
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_GUEST_SIZE.width, DEFAULT_GUEST_SIZE.height)
    }
}

/// Guest resolution in host logical pixels.
///
/// Unchanged at scale 1.0; otherwise divided by the display scale and rounded
/// to whole pixels (never below 1×1).
pub fn compute_unzoomed_size(guest: Size, scale_factor: f64) -> Size {
    if !scale_factor.is_finite() || scale_factor <= 0.0 || (scale_factor - 1.0).abs() < f64::EPSILON
    {
        return guest;
    }
    let scale = |v: u32| -> u32 {
        let scaled = (f64::from(v) / scale_factor).round();
        // Rounded, finite and non-negative; saturates for absurd inputs.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = scaled as u32;
        scaled.max(1)
    };
    Size::new(scale(guest.width), scale(guest.height))
}

/// Largest size with the guest's aspect ratio that fits inside `proposed`.
///
/// Letterboxes rather than stretches: neither axis ever exceeds the proposed
/// bounds. Of the width-constrained and height-constrained candidates, the
/// fitting one with the larger area wins (width-constrained on a tie).
pub fn fix_zoomed_full_screen_size(proposed: Size, guest: Size) -> Size {
    let (pw, ph) = (u64::from(proposed.width), u64::from(proposed.height));
    let (gw, gh) = (u64::from(guest.width), u64::from(guest.height));
    if pw == 0 || ph == 0 || gw == 0 || gh == 0 {
        return Size::zero();
    }

    // Products of two u32 values cannot overflow u64.
    let by_width = (pw, pw * gh / gw);
    let by_height = (ph * gw / gh, ph);

    let fits = |(w, h): (u64, u64)| w <= pw && h <= ph;
    let area = |(w, h): (u64, u64)| w * h;

    let best = match (fits(by_width), fits(by_height)) {
        (true, true) if area(by_height) > area(by_width) => by_height,
        (true, _) => by_width,
        (false, _) => by_height,
    };

    // Both components are bounded by the proposed u32 dimensions.
    #[allow(clippy::cast_possible_truncation)]
    Size::new(best.0 as u32, best.1 as u32)
}

/// `content` centred inside `bounds`; overflowing content is pinned to the top-left
pub fn centered(bounds: Size, content: Size) -> Rectangle {
    let margin = |outer: u32, inner: u32| -> i32 {
        i32::try_from(outer.saturating_sub(inner) / 2).unwrap_or(i32::MAX)
    };
    Rectangle::new(
        Point::new(
            margin(bounds.width, content.width),
            margin(bounds.height, content.height),
        ),
        content,
    )
}

/// Zoomed guest area inside `bounds`, with equal margins on both sides
pub fn letterbox(bounds: Size, guest: Size) -> Rectangle {
    centered(bounds, fix_zoomed_full_screen_size(bounds, guest))
}

/// Geometry state for one view
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryEngine {
    screen: ScreenGeometry,
    zoom_enabled: bool,
    zoom_interpolation: bool,
    full_screen: bool,
    scale_factor: f64,
    /// Physical size of the monitor hosting the window
    monitor: Option<Size>,
    /// Current logical content size of the window
    window: Option<Size>,
}

impl GeometryEngine {
    /// Create for the default guest resolution
    pub fn new(zoom_enabled: bool, zoom_interpolation: bool, scale_factor: f64) -> Self {
        Self {
            screen: ScreenGeometry::default(),
            zoom_enabled,
            zoom_interpolation,
            full_screen: false,
            scale_factor,
            monitor: None,
            window: None,
        }
    }

    /// Guest screen dimensions
    pub fn screen(&self) -> ScreenGeometry {
        self.screen
    }

    /// Replace the guest dimensions. Returns `true` when they changed.
    pub fn set_screen_size(&mut self, width: u32, height: u32) -> bool {
        self.screen.set_dimensions(width, height)
    }

    /// Zoom-to-fit enabled
    pub fn zoom_enabled(&self) -> bool {
        self.zoom_enabled
    }

    /// Enable or disable zoom-to-fit
    pub fn set_zoom_enabled(&mut self, enabled: bool) {
        self.zoom_enabled = enabled;
    }

    /// Bilinear filtering requested for zoomed output
    pub fn zoom_interpolation(&self) -> bool {
        self.zoom_interpolation
    }

    /// Whether the view is in full-screen mode
    pub fn full_screen(&self) -> bool {
        self.full_screen
    }

    /// Enter or leave full-screen mode
    pub fn set_full_screen(&mut self, full_screen: bool) {
        self.full_screen = full_screen;
    }

    /// Host display scale (physical / logical)
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Update the host display scale (ignores non-positive values)
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    /// Record the physical size of the monitor hosting the window
    pub fn set_monitor_size(&mut self, monitor: Option<Size>) {
        self.monitor = monitor;
    }

    /// Record the current logical content size of the window
    pub fn set_window_size(&mut self, window: Size) {
        self.window = Some(window);
    }

    /// Guest resolution in logical pixels
    pub fn compute_unzoomed_size(&self) -> Size {
        compute_unzoomed_size(self.screen.size(), self.scale_factor)
    }

    /// Target logical window size for the current guest mode and zoom state.
    ///
    /// Reads state only. Full screen + zoom letterboxes into the monitor;
    /// windowed + zoom keeps the current window area but snaps it to the
    /// guest aspect ratio; otherwise the unzoomed size.
    pub fn resize_window(&self) -> Size {
        let guest = self.screen.size();
        if self.full_screen && self.zoom_enabled {
            if let Some(monitor) = self.monitor {
                let fixed = fix_zoomed_full_screen_size(monitor, guest);
                return compute_unzoomed_size(fixed, self.scale_factor);
            }
        }
        if self.zoom_enabled && !self.full_screen {
            if let Some(window) = self.window {
                let fixed = fix_zoomed_full_screen_size(window, guest);
                if fixed.width > 0 && fixed.height > 0 {
                    return fixed;
                }
            }
        }
        self.compute_unzoomed_size()
    }

    /// Where the guest image lands inside a drawing buffer of `view` physical pixels
    pub fn content_rect(&self, view: Size) -> Rectangle {
        let guest = self.screen.size();
        let overflows = guest.width > view.width || guest.height > view.height;
        if self.zoom_enabled || overflows {
            letterbox(view, guest)
        } else {
            centered(view, guest)
        }
    }
}

impl Default for GeometryEngine {
    fn default() -> Self {
        Self::new(false, false, 1.0)
    }
}
