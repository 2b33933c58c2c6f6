//! Producer notices through to window sizing, layout and painted pixels

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use hostview::{CursorImage, GuestInputEvent, PointerAbsoluteEvent, Renderer};
use hostview_testing::{DisplayListener, Surface, TestBridge, ViewConfig, TEST_MONITOR};

#[test]
fn mode_switch_resizes_window() {
    let mut t = TestBridge::new(640, 480);
    assert_eq!(t.window().size_requests.last(), Some(&Size::new(640, 480)));

    t.display().switch_surface(Surface::new(800, 600).unwrap());
    t.tick();
    assert_eq!(t.window().size_requests.last(), Some(&Size::new(800, 600)));
    assert_eq!(t.view().physical_size(), Size::new(800, 600));
    assert_eq!(t.view().geometry().screen().size(), Size::new(800, 600));
}

#[test]
fn same_size_switch_keeps_window() {
    let mut t = TestBridge::new(640, 480);
    let requests = t.window().size_requests.len();
    t.display().switch_surface(Surface::new(640, 480).unwrap());
    t.tick();
    assert_eq!(t.window().size_requests.len(), requests);
}

#[test]
fn stale_mode_report_keeps_surface_size() {
    let mut t = TestBridge::new(640, 480);
    let requests = t.window().size_requests.len();

    // Reported mode disagrees with the installed surface
    t.display().notify_resize(1024, 768);
    t.tick();
    assert_eq!(t.view().geometry().screen().size(), Size::new(640, 480));
    assert_eq!(t.window().size_requests.len(), requests);

    t.view_mut().translator_mut().set_absolute_enabled(true);
    t.tick();
    assert!(t.move_to(Point::new(639, 479)));
    assert_eq!(
        t.take_events().last(),
        Some(&GuestInputEvent::PointerAbsolute(PointerAbsoluteEvent {
            x: 639,
            y: 479,
            buttons: hostview::ButtonMask::empty(),
        }))
    );
}

#[test]
fn updates_request_redraw() {
    let mut t = TestBridge::new(640, 480);
    t.take_redraws();
    t.view_mut().take_dirty();
    t.display()
        .notify_update(Rectangle::new(Point::new(10, 10), Size::new(4, 4)));
    t.display()
        .notify_update(Rectangle::new(Point::new(20, 20), Size::new(4, 4)));
    // Consecutive updates arrive merged
    assert_eq!(t.process_notices(), 1);
    assert_eq!(t.take_redraws(), 1);
    assert_eq!(
        t.view_mut().take_dirty(),
        Some(Rectangle::new(Point::new(10, 10), Size::new(14, 14)))
    );
}

#[test]
fn full_screen_zoom_letterboxes_and_maps_pointer() {
    let config = ViewConfig {
        zoom_to_fit: true,
        ..ViewConfig::DEFAULT
    };
    let mut t = TestBridge::with_config(config, 640, 480);
    t.view_mut().set_full_screen(true);
    assert!(t.window().full_screen);
    // The window host reports the new drawing-buffer size
    t.view_mut().set_physical_size(TEST_MONITOR);
    assert_eq!(
        t.view().renderer().content_rect(),
        Rectangle::new(Point::new(240, 0), Size::new(1440, 1080))
    );

    t.view_mut().translator_mut().set_absolute_enabled(true);
    t.tick();
    assert!(t.move_to(Point::new(960, 540)));
    assert_eq!(
        t.take_events().last(),
        Some(&GuestInputEvent::PointerAbsolute(PointerAbsoluteEvent {
            x: 320,
            y: 240,
            buttons: hostview::ButtonMask::empty(),
        }))
    );

    // Letterbox margin is host territory while ungrabbed
    assert!(!t.move_to(Point::new(100, 540)));
    assert!(t.take_events().is_empty());
}

#[test]
fn damage_is_reported_in_view_pixels() {
    let config = ViewConfig {
        zoom_to_fit: true,
        ..ViewConfig::DEFAULT
    };
    let mut t = TestBridge::with_config(config, 640, 480);
    t.view_mut().set_full_screen(true);
    t.view_mut().set_physical_size(TEST_MONITOR);
    // Relayout repaints the whole guest area
    assert_eq!(t.view_mut().take_damage(), Some(t.view().renderer().content_rect()));
    assert_eq!(t.view_mut().take_damage(), None);

    t.display()
        .notify_update(Rectangle::new(Point::new(1, 1), Size::new(1, 1)));
    t.tick();
    assert_eq!(
        t.view_mut().take_damage(),
        Some(Rectangle::new(Point::new(242, 2), Size::new(3, 3)))
    );
}

#[test]
fn paint_shows_guest_pixels_and_pause_dims() {
    let mut t = TestBridge::new(64, 48);
    t.display().with_surface_mut(|s| {
        s.fill_rect(Rectangle::new(Point::zero(), Size::new(64, 48)), 0x00C0_4020);
    });
    t.display()
        .notify_update(Rectangle::new(Point::zero(), Size::new(64, 48)));
    t.tick();
    assert_eq!(t.painted_pixel(10, 10), Some(0x00C0_4020));

    t.view_mut().set_paused(true);
    assert!(t.window().title.ends_with("[Paused]"));
    assert_eq!(t.painted_pixel(10, 10), Some(0x0060_2010));

    t.view_mut().set_paused(false);
    assert_eq!(t.window().title, "hostview");
}

#[test]
fn cursor_overlay_follows_mouse() {
    let mut t = TestBridge::new(64, 48);
    let cursor = CursorImage::from_pixels(2, 2, 0, 0, vec![0xFFFF_FFFF; 4]).unwrap();
    t.display().notify_cursor_change(Some(cursor), true);
    t.display().notify_mouse_position(10, 10, true);
    t.tick();
    assert_eq!(t.painted_pixel(10, 10), Some(0x00FF_FFFF));
    assert_eq!(t.painted_pixel(20, 20), Some(0));

    t.take_redraws();
    t.display().notify_mouse_position(20, 20, true);
    t.process_notices();
    assert!(t.take_redraws() > 0);
    assert_eq!(t.painted_pixel(10, 10), Some(0));
    assert_eq!(t.painted_pixel(21, 21), Some(0x00FF_FFFF));

    // Hidden cursor is not drawn
    t.display().notify_mouse_position(20, 20, false);
    t.tick();
    assert_eq!(t.painted_pixel(21, 21), Some(0));
}

#[test]
fn ui_info_tracks_view() {
    let t = TestBridge::new(320, 200);
    let info = t.view().ui_info();
    assert_eq!((info.width, info.height), (320, 200));
    assert!(!info.full_screen);
    assert!((info.scale_factor - 1.0).abs() < f64::EPSILON);
}

#[test]
fn hidpi_window_is_requested_in_logical_pixels() {
    let config = ViewConfig {
        scale_factor: 2.0,
        ..ViewConfig::DEFAULT
    };
    let t = TestBridge::with_config(config, 800, 600);
    assert_eq!(t.window().size_requests.last(), Some(&Size::new(400, 300)));
    assert_eq!(t.view().physical_size(), Size::new(800, 600));
}

#[test]
fn screenshot_writes_file() {
    let t = TestBridge::new(32, 32);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    Renderer::screenshot(t.view().store(), &path).unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}
