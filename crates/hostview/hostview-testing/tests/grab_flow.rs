//! Pointer grab, release and pointer-mode switching through the full controller

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use embedded_graphics::prelude::*;
use hostview::{GuestInputEvent, PointerAbsoluteEvent};
use hostview_testing::{usage, HostButton, HostEvent, RecordingPointer, TestBridge, ViewConfig};

fn relative_sum(events: &[GuestInputEvent]) -> Point {
    events.iter().fold(Point::zero(), |acc, event| match event {
        GuestInputEvent::PointerRelative(m) => acc + Point::new(m.dx, m.dy),
        _ => acc,
    })
}

#[test]
fn click_grabs_moves_sum_and_chord_releases() {
    let mut t = TestBridge::new(640, 480);
    t.move_to(Point::new(100, 100));
    assert!(t.take_events().is_empty(), "ungrabbed motion stays on the host");

    t.click();
    assert!(t.is_grabbed());
    assert!(!t.pointer().visible);
    assert!(t.pointer().grabbed);
    assert!(t.window().title.ends_with("Press Ctrl+Alt+G to release Mouse"));
    assert!(t.take_events().is_empty(), "the grabbing click is not forwarded");

    for (dx, dy) in [(5, 0), (0, 5), (-5, -5)] {
        t.move_by(dx, dy);
    }
    let events = t.take_events();
    assert_eq!(events.len(), 3);
    assert_eq!(relative_sum(&events), Point::zero());

    t.chord(&[usage::LEFT_CTRL, usage::LEFT_ALT], usage::G);
    assert!(!t.is_grabbed());
    assert!(t.pointer().visible);
    assert!(!t.pointer().grabbed);
    assert_eq!(t.window().title, "hostview");
}

#[test]
fn warp_echo_is_not_forwarded() {
    let mut t = TestBridge::new(640, 480);
    t.click();
    let center = t.view().translator().view_center();
    t.move_to(center);
    t.move_to(center);
    assert!(t.take_events().is_empty());
}

#[test]
fn focus_loss_raises_keys_and_ungrabs() {
    let mut t = TestBridge::new(640, 480);
    t.click();
    t.send(HostEvent::KeyDown { code: 0x04, repeat: false });
    t.send(HostEvent::KeyDown { code: usage::LEFT_SHIFT, repeat: false });
    t.take_events();

    t.send(HostEvent::FocusLost);
    assert!(!t.is_grabbed());
    let releases = t
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, GuestInputEvent::Key(k) if !k.pressed))
        .count();
    assert_eq!(releases, 2);

    // Second raise is a no-op
    t.view_mut().translator_mut().raise_all_keys();
    assert!(t.take_events().is_empty());
}

#[test]
fn absolute_mode_applies_at_refresh_and_drops_grab() {
    let mut t = TestBridge::new(640, 480);
    t.click();
    t.view_mut().translator_mut().set_absolute_enabled(true);
    assert_eq!(t.view().translator().pending_absolute(), Some(true));

    // Still relative until the tick
    t.move_by(2, 0);
    assert!(matches!(
        t.take_events().last(),
        Some(GuestInputEvent::PointerRelative(_))
    ));

    t.tick();
    assert!(t.view().translator().absolute_enabled());
    assert!(!t.is_grabbed());

    t.move_to(Point::new(40, 30));
    assert_eq!(
        t.take_events().last(),
        Some(&GuestInputEvent::PointerAbsolute(PointerAbsoluteEvent {
            x: 40,
            y: 30,
            buttons: hostview::ButtonMask::empty(),
        }))
    );

    // Clicking in absolute mode is forwarded, not a grab
    t.send(HostEvent::ButtonDown(HostButton::Primary));
    assert!(!t.is_grabbed());
    assert!(matches!(
        t.take_events().last(),
        Some(GuestInputEvent::PointerAbsolute(m)) if m.buttons.contains(hostview::ButtonMask::LEFT)
    ));
}

#[test]
fn wheel_bursts_are_capped() {
    let mut t = TestBridge::new(640, 480);
    t.click();
    t.send(HostEvent::Wheel { dy: -1000.0 });
    let events = t.take_events();
    // One press and one release per step
    assert_eq!(events.len(), 2 * 16);
    assert!(events.iter().step_by(2).all(|e| matches!(
        e,
        GuestInputEvent::PointerRelative(m) if m.buttons.contains(hostview::ButtonMask::WHEEL_DOWN)
    )));
}

#[test]
fn locked_pointer_moves_by_raw_deltas() {
    let mut t = TestBridge::with_pointer(ViewConfig::DEFAULT, RecordingPointer::locking(), 640, 480);
    assert!(!t.nudge(4.0, 4.0), "raw motion stays on the host while ungrabbed");

    t.click();
    assert!(t.is_grabbed());
    assert!(t.pointer().locked);
    assert!(!t.pointer().visible);

    // Frozen positions are swallowed without motion
    assert!(t.move_to(Point::new(320, 240)));
    assert!(t.move_to(Point::new(321, 240)));
    assert!(t.take_events().is_empty());

    assert!(t.nudge(5.0, 0.0));
    assert!(t.nudge(0.0, -3.0));
    assert!(t.nudge(0.5, 0.0));
    let events = t.take_events();
    assert_eq!(events.len(), 2);
    assert_eq!(relative_sum(&events), Point::new(5, -3));
    assert!(t.pointer().warps.is_empty(), "a locked pointer is never warped");

    t.chord(&[usage::LEFT_CTRL, usage::LEFT_ALT], usage::G);
    assert!(!t.pointer().locked);
    assert!(!t.nudge(5.0, 0.0));
}

#[test]
fn suspend_releases_input_and_gates_events() {
    let mut t = TestBridge::new(640, 480);
    t.click();
    t.send(HostEvent::ButtonDown(HostButton::Secondary));
    t.send(HostEvent::KeyDown { code: 0x04, repeat: false });
    t.take_events();

    t.suspend();
    assert!(!t.is_grabbed());
    assert!(t.pointer().visible);
    assert_eq!(t.window().title, "hostview");
    let events = t.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, GuestInputEvent::Key(k) if k.code == 0x04 && !k.pressed)));
    assert!(matches!(
        events.last(),
        Some(GuestInputEvent::PointerRelative(m)) if m.buttons.is_empty()
    ));

    // Nothing gets through until the host resumes
    assert!(!t.send(HostEvent::ButtonUp(HostButton::Secondary)));
    t.click();
    assert!(!t.is_grabbed());
    assert!(t.take_events().is_empty());

    t.resume();
    t.click();
    assert!(t.is_grabbed());
}
