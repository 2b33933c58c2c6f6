//! Property-based tests for view geometry and pointer mapping.
//! Verifies invariants hold for ALL valid inputs, not just fixed examples.

#![allow(clippy::arithmetic_side_effects, clippy::cast_sign_loss)]

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use hostview::geometry::{compute_unzoomed_size, fix_zoomed_full_screen_size, letterbox};
use hostview::translator::map_absolute;

proptest::proptest! {
    /// The zoomed size never exceeds the proposed bounds on either axis.
    #[test]
    fn zoomed_size_fits_bounds(
        pw in 1u32..8000, ph in 1u32..8000,
        gw in 1u32..8000, gh in 1u32..8000,
    ) {
        let fixed = fix_zoomed_full_screen_size(Size::new(pw, ph), Size::new(gw, gh));
        assert!(fixed.width <= pw, "{fixed:?} wider than {pw}");
        assert!(fixed.height <= ph, "{fixed:?} taller than {ph}");
    }

    /// The zoomed size fills one axis completely and keeps the guest aspect
    /// ratio up to integer flooring.
    #[test]
    fn zoomed_size_is_maximal_and_keeps_aspect(
        pw in 1u32..8000, ph in 1u32..8000,
        gw in 1u32..4000, gh in 1u32..4000,
    ) {
        let fixed = fix_zoomed_full_screen_size(Size::new(pw, ph), Size::new(gw, gh));
        assert!(fixed.width == pw || fixed.height == ph);

        let cross = i128::from(fixed.width) * i128::from(gh) - i128::from(fixed.height) * i128::from(gw);
        assert!(cross.abs() < i128::from(gw.max(gh)), "aspect drift {cross} for {fixed:?}");
    }

    /// Letterbox margins are split evenly (the odd pixel goes right / bottom).
    #[test]
    fn letterbox_is_centred(
        bw in 1u32..4000, bh in 1u32..4000,
        gw in 1u32..4000, gh in 1u32..4000,
    ) {
        let rect = letterbox(Size::new(bw, bh), Size::new(gw, gh));
        let left = rect.top_left.x as u32;
        let top = rect.top_left.y as u32;
        let right = bw - left - rect.size.width;
        let bottom = bh - top - rect.size.height;
        assert!(right == left || right == left + 1);
        assert!(bottom == top || bottom == top + 1);
    }

    /// Absolute mapping always lands on a guest pixel, wherever the pointer is.
    #[test]
    fn absolute_mapping_stays_on_screen(
        px in -5000i32..5000, py in -5000i32..5000,
        cx in 0i32..500, cy in 0i32..500,
        cw in 1u32..4000, ch in 1u32..4000,
        gw in 1u32..4000, gh in 1u32..4000,
    ) {
        let content = Rectangle::new(Point::new(cx, cy), Size::new(cw, ch));
        let (x, y) = map_absolute(Point::new(px, py), content, Size::new(gw, gh));
        assert!(x < gw && y < gh);
    }

    /// Scaling to logical pixels never produces an empty window.
    #[test]
    fn unzoomed_size_is_never_empty(
        w in 1u32..10000, h in 1u32..10000,
        scale in 0.25f64..8.0,
    ) {
        let size = compute_unzoomed_size(Size::new(w, h), scale);
        assert!(size.width >= 1 && size.height >= 1);
    }
}

#[test]
fn four_three_into_sixteen_nine() {
    let rect = letterbox(Size::new(1920, 1080), Size::new(640, 480));
    assert_eq!(rect, Rectangle::new(Point::new(240, 0), Size::new(1440, 1080)));
}
