//! Display abstraction layer
//!
//! Guest-side pixel containers and the callback contract the emulated
//! display adapter uses to tell the host front-end what changed.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Display-output callbacks, invoked from the emulation thread.
///
/// Implementations must be cheap and non-blocking: they record what changed
/// and let the UI thread catch up on its next refresh.
pub trait DisplayListener {
    /// Pixels inside `region` were rewritten
    fn notify_update(&self, region: Rectangle);

    /// The guest switched display mode
    fn notify_resize(&self, width: u32, height: u32);

    /// Periodic refresh tick from the display adapter
    fn notify_refresh(&self);

    /// The guest installed a new hardware cursor (or hid it)
    fn notify_cursor_change(&self, image: Option<CursorImage>, show: bool);

    /// The guest moved its hardware cursor
    fn notify_mouse_position(&self, _x: i32, _y: i32, _visible: bool) {}
}

/// Errors building pixel containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// Width or height is zero
    #[error("surface dimensions must be non-zero (got {width}x{height})")]
    ZeroSized {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
    /// Pixel buffer does not hold exactly `width * height` pixels
    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    LengthMismatch {
        /// `width * height`
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },
    /// `width * height` overflows `usize`
    #[error("surface dimensions {width}x{height} are too large")]
    TooLarge {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

fn pixel_count(width: u32, height: u32) -> Result<usize, SurfaceError> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::ZeroSized { width, height });
    }
    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .ok_or(SurfaceError::TooLarge { width, height })
}

/// Guest frame buffer (XRGB8888, stride == width).
///
/// Dimensions are fixed at construction. A mode switch produces a new
/// `Surface` rather than resizing this one, so the buffer length always
/// matches `width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Surface {
    /// Create a black surface
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let len = pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; len],
        })
    }

    /// Wrap an existing pixel buffer
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, SurfaceError> {
        let expected = pixel_count(width, height)?;
        if pixels.len() != expected {
            return Err(SurfaceError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as a `Size`
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Rectangle covering the whole surface
    pub fn bounding_box(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.size())
    }

    /// Row-major pixel data
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable row-major pixel data. The slice length cannot change.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = usize::try_from(y).ok()?.checked_mul(usize::try_from(self.width).ok()?)?;
        row.checked_add(usize::try_from(x).ok()?)
    }

    /// Read one pixel; `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).and_then(|i| self.pixels.get(i).copied())
    }

    /// Write one pixel; out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, color: u32) {
        if let Some(px) = self.index(x, y).and_then(|i| self.pixels.get_mut(i)) {
            *px = color;
        }
    }

    /// Fill `region`, clipped to the surface
    pub fn fill_rect(&mut self, region: Rectangle, color: u32) {
        let clipped = region.intersection(&self.bounding_box());
        let Some(bottom_right) = clipped.bottom_right() else {
            return;
        };
        for y in clipped.top_left.y..=bottom_right.y {
            for x in clipped.top_left.x..=bottom_right.x {
                // Clipped to the surface, so both coordinates are non-negative.
                #[allow(clippy::cast_sign_loss)]
                self.set_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Guest hardware cursor (ARGB8888, premultiplied alpha not assumed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorImage {
    width: u32,
    height: u32,
    hot_x: u32,
    hot_y: u32,
    pixels: Vec<u32>,
}

impl CursorImage {
    /// Wrap an ARGB pixel buffer with a hot spot
    ///
    /// The hot spot is clamped into the image.
    pub fn from_pixels(
        width: u32,
        height: u32,
        hot_x: u32,
        hot_y: u32,
        pixels: Vec<u32>,
    ) -> Result<Self, SurfaceError> {
        let expected = pixel_count(width, height)?;
        if pixels.len() != expected {
            return Err(SurfaceError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            hot_x: hot_x.min(width.saturating_sub(1)),
            hot_y: hot_y.min(height.saturating_sub(1)),
            pixels,
        })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as a `Size`
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Hot spot, relative to the image's top-left corner
    pub fn hot_spot(&self) -> Point {
        // Clamped into the image in the constructor, so both fit in i32 for any sane cursor.
        #[allow(clippy::cast_possible_wrap)]
        Point::new(self.hot_x as i32, self.hot_y as i32)
    }

    /// Row-major ARGB pixels
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}
