//! Guest frame to host pixels
//!
//! [`Renderer::paint`] copies the current surface into an XRGB destination
//! buffer (the softbuffer frame in the window host), scaled into the content
//! rectangle computed by [`GeometryEngine`](crate::geometry::GeometryEngine),
//! and blends the guest cursor overlay on top. The store lock is held only
//! for that copy.
//!
//! Dirty regions are kept in guest coordinates and unioned until the window
//! host drains them with [`Renderer::take_dirty`] and maps them into the
//! drawing buffer with [`Renderer::view_region`] to present only the damage.

use std::path::Path;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use image::{Rgb, RgbImage};
use platform::Surface;

use crate::error::BridgeError;
use crate::surface_store::{Frame, MousePosition, SurfaceStore};

/// Background outside the guest area
const BACKGROUND: u32 = 0x0000_0000;

/// Smallest rectangle containing both `a` and `b`.
///
/// Zero-sized inputs contribute nothing.
pub fn union(a: Rectangle, b: Rectangle) -> Rectangle {
    let (Some(a_br), Some(b_br)) = (a.bottom_right(), b.bottom_right()) else {
        return if a.is_zero_sized() { b } else { a };
    };
    let top_left = Point::new(a.top_left.x.min(b.top_left.x), a.top_left.y.min(b.top_left.y));
    let bottom_right = Point::new(a_br.x.max(b_br.x), a_br.y.max(b_br.y));
    Rectangle::with_corners(top_left, bottom_right)
}

/// Region to repaint when the guest cursor moves.
///
/// Union of the cursor's old and new footprints (hot spot applied), clipped
/// to the screen. `None` when neither footprint touches the screen.
pub fn cursor_dirty_rect(
    old: MousePosition,
    new: MousePosition,
    cursor: Size,
    hot_spot: Point,
    screen: Size,
) -> Option<Rectangle> {
    let footprint = |m: MousePosition| {
        Rectangle::new(Point::new(m.x, m.y) - hot_spot, cursor)
    };
    let dirty = union(footprint(old), footprint(new))
        .intersection(&Rectangle::new(Point::zero(), screen));
    (!dirty.is_zero_sized()).then_some(dirty)
}

/// Software renderer for one view
#[derive(Debug, Clone)]
pub struct Renderer {
    view: Size,
    content: Rectangle,
    interpolation: bool,
    paused: bool,
    dirty: Option<Rectangle>,
}

impl Renderer {
    /// Create with an empty layout; call [`Renderer::relayout`] before painting
    pub fn new(interpolation: bool) -> Self {
        Self {
            view: Size::zero(),
            content: Rectangle::zero(),
            interpolation,
            paused: false,
            dirty: None,
        }
    }

    /// Adopt a new drawing-buffer size and guest rectangle (physical pixels)
    pub fn relayout(&mut self, view: Size, content: Rectangle) {
        if self.view != view || self.content != content {
            tracing::debug!(
                view_w = view.width,
                view_h = view.height,
                x = content.top_left.x,
                y = content.top_left.y,
                w = content.size.width,
                h = content.size.height,
                "renderer layout"
            );
        }
        self.view = view;
        self.content = content;
    }

    /// Drawing-buffer size
    pub fn view_size(&self) -> Size {
        self.view
    }

    /// Guest rectangle inside the drawing buffer
    pub fn content_rect(&self) -> Rectangle {
        self.content
    }

    /// Bilinear (`true`) or nearest-neighbour scaling
    pub fn set_interpolation(&mut self, interpolation: bool) {
        self.interpolation = interpolation;
    }

    /// Dim the output while the guest is paused
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether the paused overlay is drawn
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Add `region` (guest coordinates) to the pending repaint, clipped to `screen`
    pub fn mark_dirty(&mut self, region: Rectangle, screen: Size) {
        let region = region.intersection(&Rectangle::new(Point::zero(), screen));
        if region.is_zero_sized() {
            return;
        }
        self.dirty = Some(match self.dirty {
            Some(pending) => union(pending, region),
            None => region,
        });
    }

    /// Take the pending repaint region
    pub fn take_dirty(&mut self) -> Option<Rectangle> {
        self.dirty.take()
    }

    /// Drawing-buffer pixels covered by `guest`, a region of a `screen`-sized
    /// guest display.
    ///
    /// Edges round outward so a scaled region is never under-reported, and
    /// the result is clipped to the drawing buffer.
    pub fn view_region(&self, guest: Rectangle, screen: Size) -> Rectangle {
        let Some(bottom_right) = guest.bottom_right() else {
            return Rectangle::zero();
        };
        let axis = |start: i32, end: i32, origin: i32, extent: u32, source: u32| -> (i64, i64) {
            if source == 0 {
                return (i64::from(origin), i64::from(origin) + i64::from(extent));
            }
            let (extent, source) = (i64::from(extent), i64::from(source));
            let lo = (i64::from(start) * extent).div_euclid(source);
            let hi = (i64::from(end) * extent + source - 1).div_euclid(source);
            (i64::from(origin) + lo, i64::from(origin) + hi)
        };
        let content = self.content;
        let (x0, x1) = axis(
            guest.top_left.x,
            bottom_right.x + 1,
            content.top_left.x,
            content.size.width,
            screen.width,
        );
        let (y0, y1) = axis(
            guest.top_left.y,
            bottom_right.y + 1,
            content.top_left.y,
            content.size.height,
            screen.height,
        );
        let clamp = |v: i64, max: u32| i32::try_from(v.clamp(0, i64::from(max))).unwrap_or(0);
        let top_left = Point::new(clamp(x0, self.view.width), clamp(y0, self.view.height));
        let end = Point::new(clamp(x1, self.view.width), clamp(y1, self.view.height));
        let size = end - top_left;
        Rectangle::new(
            top_left,
            Size::new(
                u32::try_from(size.x).unwrap_or(0),
                u32::try_from(size.y).unwrap_or(0),
            ),
        )
    }

    /// Paint the current frame into `dst`, a row-major buffer of `dst_size`.
    ///
    /// The whole buffer is cleared first. Returns `false` (leaving a black
    /// frame) when no surface is installed or `dst` is too short.
    pub fn paint(&self, store: &SurfaceStore, dst: &mut [u32], dst_size: Size) -> bool {
        dst.fill(BACKGROUND);
        let Ok(width) = usize::try_from(dst_size.width) else {
            return false;
        };
        let needed = width.saturating_mul(usize::try_from(dst_size.height).unwrap_or(0));
        if width == 0 || dst.len() < needed {
            return false;
        }

        let target = self
            .content
            .intersection(&Rectangle::new(Point::zero(), dst_size));
        let Some(bottom_right) = target.bottom_right() else {
            return false;
        };

        store
            .with_frame(|frame| {
                for (y, row) in dst.chunks_exact_mut(width).enumerate() {
                    let Ok(y) = i32::try_from(y) else { break };
                    if y < target.top_left.y || y > bottom_right.y {
                        continue;
                    }
                    for x in target.top_left.x..=bottom_right.x {
                        let Some(px) = usize::try_from(x).ok().and_then(|i| row.get_mut(i)) else {
                            continue;
                        };
                        *px = self.shade(frame, Point::new(x, y));
                    }
                }
            })
            .is_some()
    }

    /// Colour of one destination pixel inside the content rectangle
    fn shade(&self, frame: &Frame<'_>, at: Point) -> u32 {
        let surface = frame.surface;
        let (gx, gy) = self.to_guest(at, surface.size());
        let mut color = if self.interpolation && self.content.size != surface.size() {
            sample_bilinear(surface, gx, gy)
        } else {
            // Non-negative and below the guest size after to_guest clamping
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (sx, sy) = (gx as u32, gy as u32);
            surface.pixel(sx, sy).unwrap_or(BACKGROUND)
        };

        if let (Some(cursor), true, true) = (frame.cursor, frame.cursor_visible, frame.mouse.on) {
            let origin = Point::new(frame.mouse.x, frame.mouse.y) - cursor.hot_spot();
            #[allow(clippy::cast_possible_truncation)]
            let guest = Point::new(gx.floor() as i32, gy.floor() as i32);
            let local = guest - origin;
            if let (Ok(cx), Ok(cy)) = (u32::try_from(local.x), u32::try_from(local.y)) {
                if let Some(argb) = cursor_pixel(cursor.pixels(), cursor.width(), cx, cy) {
                    color = blend(color, argb);
                }
            }
        }

        if self.paused {
            dim(color)
        } else {
            color
        }
    }

    /// Destination pixel centre to guest coordinates (clamped into the surface)
    fn to_guest(&self, at: Point, guest: Size) -> (f32, f32) {
        let axis = |pos: i32, origin: i32, extent: u32, target: u32| -> f32 {
            if extent == 0 {
                return 0.0;
            }
            #[allow(clippy::cast_precision_loss)]
            let g = ((pos - origin) as f32 + 0.5) * target as f32 / extent as f32;
            #[allow(clippy::cast_precision_loss)]
            let max = target.saturating_sub(1) as f32;
            if self.interpolation {
                (g - 0.5).clamp(0.0, max)
            } else {
                g.floor().clamp(0.0, max)
            }
        };
        (
            axis(at.x, self.content.top_left.x, self.content.size.width, guest.width),
            axis(at.y, self.content.top_left.y, self.content.size.height, guest.height),
        )
    }

    /// Write the current surface to an image file (format from the extension)
    pub fn screenshot(store: &SurfaceStore, path: impl AsRef<Path>) -> Result<(), BridgeError> {
        let image = store
            .with_surface(surface_to_rgb)
            .ok_or(BridgeError::NoSurface)?;
        image.save(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "screenshot saved");
        Ok(())
    }
}

fn surface_to_rgb(surface: &Surface) -> RgbImage {
    RgbImage::from_fn(surface.width(), surface.height(), |x, y| {
        let [_, r, g, b] = surface.pixel(x, y).unwrap_or(BACKGROUND).to_be_bytes();
        Rgb([r, g, b])
    })
}

fn cursor_pixel(pixels: &[u32], width: u32, x: u32, y: u32) -> Option<u32> {
    if x >= width {
        return None;
    }
    let index = usize::try_from(y)
        .ok()?
        .checked_mul(usize::try_from(width).ok()?)?
        .checked_add(usize::try_from(x).ok()?)?;
    pixels.get(index).copied()
}

fn sample_bilinear(surface: &Surface, gx: f32, gy: f32) -> u32 {
    // gx, gy are clamped into the surface by to_guest
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x0, y0) = (gx.floor() as u32, gy.floor() as u32);
    let x1 = (x0 + 1).min(surface.width() - 1);
    let y1 = (y0 + 1).min(surface.height() - 1);
    let (tx, ty) = (gx - gx.floor(), gy - gy.floor());

    let at = |x, y| surface.pixel(x, y).unwrap_or(BACKGROUND).to_be_bytes();
    let (p00, p10, p01, p11) = (at(x0, y0), at(x1, y0), at(x0, y1), at(x1, y1));

    let mut out = [0u8; 4];
    for (channel, slot) in out.iter_mut().enumerate().skip(1) {
        let c = |p: [u8; 4]| f32::from(p.get(channel).copied().unwrap_or(0));
        let top = c(p00) * (1.0 - tx) + c(p10) * tx;
        let bottom = c(p01) * (1.0 - tx) + c(p11) * tx;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
        *slot = value;
    }
    u32::from_be_bytes(out)
}

/// Source-over blend of an ARGB pixel onto an XRGB pixel
fn blend(dst: u32, argb: u32) -> u32 {
    let [a, sr, sg, sb] = argb.to_be_bytes();
    match a {
        0 => dst,
        255 => argb & 0x00FF_FFFF,
        _ => {
            let [_, dr, dg, db] = dst.to_be_bytes();
            let mix = |s: u8, d: u8| -> u8 {
                let v = (u16::from(s) * u16::from(a) + u16::from(d) * (255 - u16::from(a))) / 255;
                u8::try_from(v).unwrap_or(u8::MAX)
            };
            u32::from_be_bytes([0, mix(sr, dr), mix(sg, dg), mix(sb, db)])
        }
    }
}

fn dim(color: u32) -> u32 {
    (color >> 1) & 0x007F_7F7F
}
