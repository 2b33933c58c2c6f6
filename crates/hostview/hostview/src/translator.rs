//! Host input to neutral guest input
//!
//! [`InputTranslator`] owns the pressed-key table and the mouse-grab state
//! machine. It receives [`HostEvent`]s on the UI thread, decides which are
//! bridge gestures and which belong to the guest, and forwards the latter to
//! an [`InputSink`] as [`GuestInputEvent`]s.
//!
//! # Gestures
//!
//! | Gesture                          | Effect                      |
//! |----------------------------------|-----------------------------|
//! | Primary click, ungrabbed, relative | grab the mouse (consumed) |
//! | Ctrl+Alt+G while grabbed         | release the mouse (consumed)|
//! | Focus lost                       | raise all keys, then release|
//!
//! # Pointer modes
//!
//! In relative mode only motion while grabbed reaches the guest, as deltas
//! from the last position; the host pointer is warped back to the view
//! centre after each delta. Where the platform can only lock the pointer in
//! place, positions stop changing and raw [`HostEvent::MouseDelta`] motion
//! is forwarded instead, with no warping. In absolute mode motion inside the guest area is
//! mapped linearly onto guest pixels and clamped.
//!
//! Switching between the two is staged by [`InputTranslator::set_absolute_enabled`]
//! and takes effect at the next [`InputTranslator::on_refresh`].

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use platform::{
    ButtonMask, GuestInputEvent, InputSink, KeyEvent, PointerAbsoluteEvent, PointerRelativeEvent,
};

use crate::geometry::DEFAULT_GUEST_SIZE;
use crate::keymap::{self, usage};

/// Wheel steps forwarded per host event; larger bursts are truncated
const MAX_WHEEL_STEPS: u32 = 16;

/// Host mouse buttons the bridge knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostButton {
    /// Left / primary
    Primary,
    /// Right / secondary
    Secondary,
    /// Wheel click
    Middle,
    /// Thumb button, usually "back"
    Side,
    /// Thumb button, usually "forward"
    Extra,
}

impl HostButton {
    fn mask(self) -> ButtonMask {
        match self {
            HostButton::Primary => ButtonMask::LEFT,
            HostButton::Secondary => ButtonMask::RIGHT,
            HostButton::Middle => ButtonMask::MIDDLE,
            HostButton::Side => ButtonMask::SIDE,
            HostButton::Extra => ButtonMask::EXTRA,
        }
    }
}

/// Host-neutral input event, produced by the window host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// Key pressed (`repeat` for auto-repeat)
    KeyDown {
        /// HID usage of the physical key
        code: u8,
        /// Generated by host auto-repeat
        repeat: bool,
    },
    /// Key released
    KeyUp {
        /// HID usage of the physical key
        code: u8,
    },
    /// Pointer moved, in physical view pixels
    MouseMoved {
        /// New pointer position
        position: Point,
    },
    /// Mouse button pressed
    ButtonDown(HostButton),
    /// Mouse button released
    ButtonUp(HostButton),
    /// Raw device motion, in unaccelerated device units.
    ///
    /// Only forwarded while the pointer is grabbed and locked.
    MouseDelta {
        /// Horizontal motion
        dx: f64,
        /// Vertical motion
        dy: f64,
    },
    /// Wheel scrolled, in lines; positive is away from the user
    Wheel {
        /// Vertical delta
        dy: f64,
    },
    /// The view lost keyboard focus
    FocusLost,
    /// The view gained keyboard focus
    FocusGained,
}

/// Mouse capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrabState {
    /// Host pointer belongs to the desktop
    #[default]
    Ungrabbed,
    /// Host pointer motion is redirected to the guest
    Grabbed,
}

/// Side effects on the host pointer, implemented by the window host
pub trait PointerControl {
    /// Show or hide the host pointer over the view
    fn set_cursor_visible(&mut self, visible: bool);

    /// Confine (or release) the host pointer to the view.
    ///
    /// Returns `true` when the grab locked the pointer in place instead, so
    /// motion only arrives as [`HostEvent::MouseDelta`].
    fn set_cursor_grab(&mut self, grab: bool) -> bool;

    /// Move the host pointer to `position` (physical view pixels).
    ///
    /// Returns `false` when the platform cannot warp; relative tracking then
    /// continues from the unwarped position.
    fn warp_pointer(&mut self, position: Point) -> bool;
}

/// Behaviour switches copied from the view configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslatorOptions {
    /// Swap Alt and GUI before forwarding
    pub swap_option_command: bool,
    /// Keep the host pointer visible while grabbed
    pub show_cursor: bool,
}

/// Stateful key tracker and grab state machine
pub struct InputTranslator {
    sink: Box<dyn InputSink>,
    pointer: Box<dyn PointerControl>,
    options: TranslatorOptions,

    pressed: [bool; 256],
    grab: GrabState,
    absolute_enabled: bool,
    pending_absolute: Option<bool>,
    last_mouse: Point,
    pointer_locked: bool,
    motion_acc: (f64, f64),
    buttons: ButtonMask,
    scroll_acc: f64,
    cursor_hidden: bool,

    view: Size,
    content: Rectangle,
    guest: Size,
}

impl InputTranslator {
    /// Create in the ungrabbed, relative state
    pub fn new(
        sink: Box<dyn InputSink>,
        pointer: Box<dyn PointerControl>,
        options: TranslatorOptions,
    ) -> Self {
        Self {
            sink,
            pointer,
            options,
            pressed: [false; 256],
            grab: GrabState::Ungrabbed,
            absolute_enabled: false,
            pending_absolute: None,
            last_mouse: Point::zero(),
            pointer_locked: false,
            motion_acc: (0.0, 0.0),
            buttons: ButtonMask::empty(),
            scroll_acc: 0.0,
            cursor_hidden: false,
            view: DEFAULT_GUEST_SIZE,
            content: Rectangle::new(Point::zero(), DEFAULT_GUEST_SIZE),
            guest: DEFAULT_GUEST_SIZE,
        }
    }

    /// Tell the translator where the guest image sits in the view.
    ///
    /// `view` is the drawing buffer size, `content` the guest rectangle in
    /// it and `guest` the guest resolution, all in physical pixels.
    pub fn set_layout(&mut self, view: Size, content: Rectangle, guest: Size) {
        self.view = view;
        self.content = content;
        self.guest = guest;
    }

    /// Current grab state
    pub fn grab_state(&self) -> GrabState {
        self.grab
    }

    /// Whether the mouse is grabbed
    pub fn is_grabbed(&self) -> bool {
        self.grab == GrabState::Grabbed
    }

    /// Whether the grab locked the host pointer in place
    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    /// Absolute pointer mode currently in force
    pub fn absolute_enabled(&self) -> bool {
        self.absolute_enabled
    }

    /// Mode waiting for the next refresh, if any
    pub fn pending_absolute(&self) -> Option<bool> {
        self.pending_absolute
    }

    /// Whether the host key with HID usage `code` is held
    pub fn is_pressed(&self, code: u8) -> bool {
        self.pressed.get(usize::from(code)).copied().unwrap_or(false)
    }

    /// Either Control key and either Alt key are held
    pub fn ctrl_alt_held(&self) -> bool {
        let ctrl = self.is_pressed(usage::LEFT_CTRL) || self.is_pressed(usage::RIGHT_CTRL);
        let alt = self.is_pressed(usage::LEFT_ALT) || self.is_pressed(usage::RIGHT_ALT);
        ctrl && alt
    }

    /// Mouse buttons currently held, as reported to the guest
    pub fn buttons(&self) -> ButtonMask {
        self.buttons
    }

    /// Centre of the view, the relative-mode recentring point
    pub fn view_center(&self) -> Point {
        Point::new(
            i32::try_from(self.view.width / 2).unwrap_or(0),
            i32::try_from(self.view.height / 2).unwrap_or(0),
        )
    }

    /// Process one host event.
    ///
    /// Returns `true` when the bridge handled the event, either as a gesture
    /// or by forwarding it to the guest; `false` leaves it to the host.
    pub fn handle_event(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::KeyDown { code, repeat } => self.key_down(code, repeat),
            HostEvent::KeyUp { code } => self.key_up(code),
            HostEvent::MouseMoved { position } => self.mouse_moved(position),
            HostEvent::MouseDelta { dx, dy } => self.mouse_delta(dx, dy),
            HostEvent::ButtonDown(button) => self.button(button, true),
            HostEvent::ButtonUp(button) => self.button(button, false),
            HostEvent::Wheel { dy } => self.wheel(dy),
            HostEvent::FocusLost => {
                self.raise_all_keys();
                self.raise_all_buttons();
                if self.is_grabbed() {
                    self.ungrab_mouse();
                }
                true
            }
            HostEvent::FocusGained => false,
        }
    }

    /// Release every held key.
    ///
    /// Emits one key-up per pressed key and clears the table. A second call
    /// emits nothing.
    pub fn raise_all_keys(&mut self) {
        let held: Vec<u8> = (0..=u8::MAX).filter(|&code| self.is_pressed(code)).collect();
        for code in held {
            self.set_pressed(code, false);
            self.emit_key(code, false);
        }
    }

    /// Enter the grabbed state.
    ///
    /// In relative mode the host pointer is hidden (unless `show_cursor`)
    /// and warped to the view centre, which becomes the delta origin. A
    /// locked pointer is left where it is.
    pub fn grab_mouse(&mut self) {
        if self.is_grabbed() {
            return;
        }
        self.grab = GrabState::Grabbed;
        self.pointer_locked = self.pointer.set_cursor_grab(true);
        self.motion_acc = (0.0, 0.0);
        if !self.absolute_enabled {
            if !self.options.show_cursor {
                self.set_cursor_hidden(true);
            }
            if !self.pointer_locked {
                self.recenter();
            }
        }
        tracing::debug!(
            absolute = self.absolute_enabled,
            locked = self.pointer_locked,
            "mouse grabbed"
        );
    }

    /// Leave the grabbed state and restore the host pointer
    pub fn ungrab_mouse(&mut self) {
        if !self.is_grabbed() {
            return;
        }
        self.grab = GrabState::Ungrabbed;
        self.pointer.set_cursor_grab(false);
        self.pointer_locked = false;
        self.set_cursor_hidden(false);
        tracing::debug!("mouse released");
    }

    /// Stage a pointer-mode change for the next refresh boundary
    pub fn set_absolute_enabled(&mut self, enabled: bool) {
        self.pending_absolute = (enabled != self.absolute_enabled).then_some(enabled);
    }

    /// Refresh boundary: apply a staged pointer-mode change.
    ///
    /// Switching to absolute while grabbed releases the grab first. Returns
    /// `true` when the mode changed.
    pub fn on_refresh(&mut self) -> bool {
        let Some(enabled) = self.pending_absolute.take() else {
            return false;
        };
        if enabled && self.is_grabbed() {
            self.ungrab_mouse();
        }
        self.absolute_enabled = enabled;
        if !enabled {
            self.set_cursor_hidden(false);
        }
        tracing::debug!(absolute = enabled, "pointer mode switched");
        true
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    fn key_down(&mut self, code: u8, repeat: bool) -> bool {
        if self.is_grabbed() && code == usage::G && self.ctrl_alt_held() {
            self.ungrab_mouse();
            return true;
        }
        if !repeat {
            self.set_pressed(code, true);
        } else if !self.is_pressed(code) {
            // Repeat for a key whose press we never forwarded
            return false;
        }
        self.emit_key(code, true);
        true
    }

    fn key_up(&mut self, code: u8) -> bool {
        // Releases are only forwarded for presses the guest saw
        if !self.is_pressed(code) {
            return false;
        }
        self.set_pressed(code, false);
        self.emit_key(code, false);
        true
    }

    fn set_pressed(&mut self, code: u8, held: bool) {
        if let Some(slot) = self.pressed.get_mut(usize::from(code)) {
            *slot = held;
        }
    }

    fn emit_key(&mut self, code: u8, pressed: bool) {
        let code = if self.options.swap_option_command {
            keymap::swap_option_command(code)
        } else {
            code
        };
        tracing::trace!(code, pressed, "key");
        self.sink.send(GuestInputEvent::Key(KeyEvent {
            code: u16::from(code),
            pressed,
        }));
    }

    // -----------------------------------------------------------------------
    // Pointer
    // -----------------------------------------------------------------------

    fn mouse_moved(&mut self, position: Point) -> bool {
        if self.absolute_enabled {
            let inside = self.content.contains(position);
            self.last_mouse = position;
            self.set_cursor_hidden(inside && !self.options.show_cursor);
            if !inside && !self.is_grabbed() {
                return false;
            }
            self.emit_absolute();
            return true;
        }

        if !self.is_grabbed() {
            self.last_mouse = position;
            return false;
        }
        if self.pointer_locked {
            // Motion arrives as MouseDelta while locked
            self.last_mouse = position;
            return true;
        }

        let delta = position - self.last_mouse;
        if delta == Point::zero() {
            // The echo of our own warp lands here
            return true;
        }
        self.emit_relative(delta);
        self.last_mouse = position;
        self.recenter();
        true
    }

    fn mouse_delta(&mut self, dx: f64, dy: f64) -> bool {
        if !self.pointer_locked || self.absolute_enabled || !self.is_grabbed() {
            return false;
        }
        if !dx.is_finite() || !dy.is_finite() {
            return true;
        }
        let x = map_scroll(&mut self.motion_acc.0, dx);
        let y = map_scroll(&mut self.motion_acc.1, dy);
        if x.is_some() || y.is_some() {
            self.emit_relative(Point::new(x.unwrap_or(0), y.unwrap_or(0)));
        }
        true
    }

    fn button(&mut self, button: HostButton, down: bool) -> bool {
        if down
            && button == HostButton::Primary
            && !self.is_grabbed()
            && !self.absolute_enabled
        {
            self.grab_mouse();
            return true;
        }
        if !down && !self.buttons.contains(button.mask()) {
            // The grabbing click's release, or a press we never forwarded
            return self.is_grabbed();
        }
        if !self.accepts_pointer() {
            // Let go of anything still held from before the release
            if !down && self.buttons.contains(button.mask()) {
                self.buttons.set(button.mask(), false);
                self.emit_buttons();
                return true;
            }
            return false;
        }
        self.buttons.set(button.mask(), down);
        self.emit_buttons();
        true
    }

    fn wheel(&mut self, dy: f64) -> bool {
        if !self.accepts_pointer() || !dy.is_finite() {
            return false;
        }
        let Some(steps) = map_scroll(&mut self.scroll_acc, dy) else {
            return true;
        };
        let bit = if steps > 0 {
            ButtonMask::WHEEL_UP
        } else {
            ButtonMask::WHEEL_DOWN
        };
        for _ in 0..steps.unsigned_abs().min(MAX_WHEEL_STEPS) {
            self.buttons.set(bit, true);
            self.emit_buttons();
            self.buttons.set(bit, false);
            self.emit_buttons();
        }
        true
    }

    fn raise_all_buttons(&mut self) {
        if !self.buttons.is_empty() {
            self.buttons = ButtonMask::empty();
            self.emit_buttons();
        }
    }

    /// Pointer events reach the guest when grabbed, or in absolute mode
    /// while the pointer is over the guest area
    fn accepts_pointer(&self) -> bool {
        self.is_grabbed() || (self.absolute_enabled && self.content.contains(self.last_mouse))
    }

    fn emit_buttons(&mut self) {
        if self.absolute_enabled {
            self.emit_absolute();
        } else {
            self.emit_relative(Point::zero());
        }
    }

    fn emit_relative(&mut self, delta: Point) {
        tracing::trace!(dx = delta.x, dy = delta.y, "relative motion");
        self.sink
            .send(GuestInputEvent::PointerRelative(PointerRelativeEvent {
                dx: delta.x,
                dy: delta.y,
                buttons: self.buttons,
            }));
    }

    fn emit_absolute(&mut self) {
        let (x, y) = map_absolute(self.last_mouse, self.content, self.guest);
        self.sink
            .send(GuestInputEvent::PointerAbsolute(PointerAbsoluteEvent {
                x,
                y,
                buttons: self.buttons,
            }));
    }

    fn recenter(&mut self) {
        let center = self.view_center();
        if self.pointer.warp_pointer(center) {
            self.last_mouse = center;
        }
    }

    fn set_cursor_hidden(&mut self, hidden: bool) {
        if self.cursor_hidden != hidden {
            self.cursor_hidden = hidden;
            self.pointer.set_cursor_visible(!hidden);
        }
    }
}

/// Map a view position onto guest pixels.
///
/// Linear over `content`; positions outside it clamp to the nearest edge, so
/// the result always lies in `0..guest.width` × `0..guest.height`.
pub fn map_absolute(position: Point, content: Rectangle, guest: Size) -> (u32, u32) {
    let axis = |pos: i32, origin: i32, extent: u32, target: u32| -> u32 {
        let max = i64::from(target.max(1)) - 1;
        if extent == 0 {
            return 0;
        }
        let offset = i64::from(pos) - i64::from(origin);
        let scaled = offset * i64::from(target) / i64::from(extent);
        // Clamped into 0..=u32::MAX - 1
        u32::try_from(scaled.clamp(0, max)).unwrap_or(0)
    };
    (
        axis(position.x, content.top_left.x, content.size.width, guest.width),
        axis(position.y, content.top_left.y, content.size.height, guest.height),
    )
}

/// Accumulate a wheel or raw-motion delta and return the whole steps it
/// completes.
///
/// The fractional remainder stays in `acc` for the next call.
pub(crate) fn map_scroll(acc: &mut f64, delta: f64) -> Option<i32> {
    *acc += delta;
    let whole = acc.trunc();
    if whole == 0.0 {
        return None;
    }
    *acc -= whole;
    // Saturating float-to-int conversion; bursts are capped by the caller.
    #[allow(clippy::cast_possible_truncation)]
    Some(whole as i32)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        events: Vec<GuestInputEvent>,
        visible: Vec<bool>,
        warps: Vec<Point>,
        lock_on_grab: bool,
    }

    struct Pointer(Rc<RefCell<Log>>);

    impl PointerControl for Pointer {
        fn set_cursor_visible(&mut self, visible: bool) {
            self.0.borrow_mut().visible.push(visible);
        }
        fn set_cursor_grab(&mut self, grab: bool) -> bool {
            grab && self.0.borrow().lock_on_grab
        }
        fn warp_pointer(&mut self, position: Point) -> bool {
            self.0.borrow_mut().warps.push(position);
            true
        }
    }

    fn translator(options: TranslatorOptions) -> (InputTranslator, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let sink_log = log.clone();
        let sink = move |e: GuestInputEvent| sink_log.borrow_mut().events.push(e);
        let mut t = InputTranslator::new(Box::new(sink), Box::new(Pointer(log.clone())), options);
        let view = Size::new(640, 480);
        t.set_layout(view, Rectangle::new(Point::zero(), view), view);
        (t, log)
    }

    fn key(code: u8, pressed: bool) -> GuestInputEvent {
        GuestInputEvent::Key(KeyEvent {
            code: u16::from(code),
            pressed,
        })
    }

    #[test]
    fn keys_forward_and_track() {
        let (mut t, log) = translator(TranslatorOptions::default());
        assert!(t.handle_event(HostEvent::KeyDown { code: 0x04, repeat: false }));
        assert!(t.is_pressed(0x04));
        assert!(t.handle_event(HostEvent::KeyUp { code: 0x04 }));
        assert!(!t.is_pressed(0x04));
        assert_eq!(log.borrow().events, vec![key(0x04, true), key(0x04, false)]);
    }

    #[test]
    fn orphan_release_is_dropped() {
        let (mut t, log) = translator(TranslatorOptions::default());
        assert!(!t.handle_event(HostEvent::KeyUp { code: 0x05 }));
        assert!(log.borrow().events.is_empty());
    }

    #[test]
    fn raise_all_keys_releases_then_is_idempotent() {
        let (mut t, log) = translator(TranslatorOptions::default());
        for code in [0x04, usage::LEFT_SHIFT, 0x2C] {
            t.handle_event(HostEvent::KeyDown { code, repeat: false });
        }
        log.borrow_mut().events.clear();

        t.raise_all_keys();
        let released = log.borrow().events.len();
        assert_eq!(released, 3);
        assert!(log
            .borrow()
            .events
            .iter()
            .all(|e| matches!(e, GuestInputEvent::Key(k) if !k.pressed)));

        t.raise_all_keys();
        assert_eq!(log.borrow().events.len(), released);
    }

    #[test]
    fn click_grabs_and_ctrl_alt_g_releases() {
        let (mut t, log) = translator(TranslatorOptions::default());
        assert!(t.handle_event(HostEvent::ButtonDown(HostButton::Primary)));
        assert!(t.is_grabbed());
        assert_eq!(log.borrow().warps, vec![Point::new(320, 240)]);
        assert_eq!(log.borrow().visible, vec![false]);
        // The grabbing click never reaches the guest, release included
        assert!(t.handle_event(HostEvent::ButtonUp(HostButton::Primary)));
        assert!(log.borrow().events.is_empty());

        t.handle_event(HostEvent::KeyDown { code: usage::LEFT_CTRL, repeat: false });
        t.handle_event(HostEvent::KeyDown { code: usage::LEFT_ALT, repeat: false });
        assert!(t.handle_event(HostEvent::KeyDown { code: usage::G, repeat: false }));
        assert!(!t.is_grabbed());
        assert_eq!(log.borrow().visible, vec![false, true]);
        // The G press was consumed, so its release is dropped too
        assert!(!t.handle_event(HostEvent::KeyUp { code: usage::G }));
    }

    #[test]
    fn relative_deltas_recenter() {
        let (mut t, log) = translator(TranslatorOptions::default());
        t.grab_mouse();
        let c = t.view_center();
        for d in [Point::new(5, 0), Point::new(0, 5), Point::new(-5, -5)] {
            t.handle_event(HostEvent::MouseMoved { position: c + d });
            // Echo of the warp back to centre
            t.handle_event(HostEvent::MouseMoved { position: c });
        }
        let sum = log.borrow().events.iter().fold(Point::zero(), |acc, e| match e {
            GuestInputEvent::PointerRelative(m) => acc + Point::new(m.dx, m.dy),
            _ => acc,
        });
        assert_eq!(sum, Point::zero());
        assert_eq!(log.borrow().events.len(), 3);
    }

    #[test]
    fn locked_grab_forwards_raw_motion() {
        let (mut t, log) = translator(TranslatorOptions::default());
        log.borrow_mut().lock_on_grab = true;

        // Raw motion belongs to the host until grabbed
        assert!(!t.handle_event(HostEvent::MouseDelta { dx: 4.0, dy: 0.0 }));
        t.grab_mouse();
        assert!(t.pointer_locked());
        assert!(log.borrow().warps.is_empty());

        // Positions are frozen while locked and carry no motion
        assert!(t.handle_event(HostEvent::MouseMoved { position: Point::new(10, 10) }));
        assert!(t.handle_event(HostEvent::MouseDelta { dx: 3.0, dy: -2.0 }));
        assert!(t.handle_event(HostEvent::MouseDelta { dx: 0.4, dy: 0.0 }));
        assert!(t.handle_event(HostEvent::MouseDelta { dx: 0.7, dy: f64::NAN }));
        assert!(t.handle_event(HostEvent::MouseDelta { dx: 0.7, dy: 0.0 }));
        let deltas: Vec<(i32, i32)> = log
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                GuestInputEvent::PointerRelative(m) => Some((m.dx, m.dy)),
                _ => None,
            })
            .collect();
        assert_eq!(deltas, vec![(3, -2), (1, 0)]);
        assert!(log.borrow().warps.is_empty());

        t.ungrab_mouse();
        assert!(!t.pointer_locked());
        assert!(!t.handle_event(HostEvent::MouseDelta { dx: 5.0, dy: 5.0 }));
    }

    #[test]
    fn confined_grab_ignores_raw_motion() {
        let (mut t, log) = translator(TranslatorOptions::default());
        t.grab_mouse();
        assert!(!t.pointer_locked());
        assert!(!t.handle_event(HostEvent::MouseDelta { dx: 5.0, dy: 5.0 }));
        assert!(log.borrow().events.is_empty());
    }

    #[test]
    fn absolute_switch_waits_for_refresh() {
        let (mut t, log) = translator(TranslatorOptions::default());
        t.grab_mouse();
        let c = t.view_center();
        t.set_absolute_enabled(true);
        t.handle_event(HostEvent::MouseMoved { position: c + Point::new(3, 0) });
        assert!(matches!(
            log.borrow().events.last(),
            Some(GuestInputEvent::PointerRelative(_))
        ));

        assert!(t.on_refresh());
        assert!(t.absolute_enabled());
        assert!(!t.is_grabbed());
        t.handle_event(HostEvent::MouseMoved { position: Point::new(10, 20) });
        assert!(matches!(
            log.borrow().events.last(),
            Some(GuestInputEvent::PointerAbsolute(PointerAbsoluteEvent { x: 10, y: 20, .. }))
        ));
        assert!(!t.on_refresh());
    }

    #[test]
    fn absolute_mapping_clamps() {
        let content = Rectangle::new(Point::new(240, 0), Size::new(1440, 1080));
        let guest = Size::new(640, 480);
        assert_eq!(map_absolute(Point::new(240, 0), content, guest), (0, 0));
        assert_eq!(map_absolute(Point::new(960, 540), content, guest), (320, 240));
        assert_eq!(map_absolute(Point::new(5000, 5000), content, guest), (639, 479));
        assert_eq!(map_absolute(Point::new(-10, -10), content, guest), (0, 0));
    }

    #[test]
    fn focus_loss_releases_keys_then_grab() {
        let (mut t, log) = translator(TranslatorOptions::default());
        t.grab_mouse();
        t.handle_event(HostEvent::KeyDown { code: 0x04, repeat: false });
        t.handle_event(HostEvent::FocusLost);
        assert!(!t.is_grabbed());
        assert!(!t.is_pressed(0x04));
        assert_eq!(log.borrow().events.last(), Some(&key(0x04, false)));
    }

    #[test]
    fn wheel_emits_press_release_pairs() {
        let (mut t, log) = translator(TranslatorOptions::default());
        t.grab_mouse();
        assert!(t.handle_event(HostEvent::Wheel { dy: 0.5 }));
        assert!(log.borrow().events.is_empty());
        t.handle_event(HostEvent::Wheel { dy: 0.6 });
        let masks: Vec<u8> = log
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                GuestInputEvent::PointerRelative(m) => Some(m.buttons.bits()),
                _ => None,
            })
            .collect();
        assert_eq!(masks, vec![ButtonMask::WHEEL_UP.bits(), 0]);
    }

    #[test]
    fn swap_option_command_rewrites_codes() {
        let (mut t, log) = translator(TranslatorOptions {
            swap_option_command: true,
            ..TranslatorOptions::default()
        });
        t.handle_event(HostEvent::KeyDown { code: usage::LEFT_ALT, repeat: false });
        assert_eq!(log.borrow().events, vec![key(usage::LEFT_GUI, true)]);
        // Tracking stays on the host code
        assert!(t.is_pressed(usage::LEFT_ALT));
    }

    #[test]
    fn map_scroll_accumulates() {
        let mut acc = 0.0;
        assert_eq!(map_scroll(&mut acc, 0.3), None);
        assert_eq!(map_scroll(&mut acc, 0.3), None);
        assert_eq!(map_scroll(&mut acc, 0.5), Some(1));
        assert_eq!(map_scroll(&mut acc, -2.5), Some(-2));
    }
}
