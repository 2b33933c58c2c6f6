//! Headless testing harness for the hostview bridge
//!
//! Drives a real [`Controller`] with recording stand-ins for the window
//! system, so grab, zoom and shortcut behaviour can be checked without a
//! display server.
//!
//! # Quick start
//!
//! ```no_run
//! use hostview_testing::{usage, TestBridge};
//!
//! let mut t = TestBridge::new(800, 600);
//!
//! // Click grabs the pointer, motion is reported as deltas
//! t.click();
//! t.move_by(5, 0);
//! assert!(t.is_grabbed());
//!
//! // Ctrl+Alt+G hands the pointer back
//! t.chord(&[usage::LEFT_CTRL, usage::LEFT_ALT], usage::G);
//! assert!(!t.is_grabbed());
//! assert!(t.pointer().visible);
//! ```
//!
//! # What is recorded
//!
//! | Stand-in            | Log                                              |
//! |---------------------|--------------------------------------------------|
//! | [`RecordingSink`]   | every [`GuestInputEvent`] sent to the guest      |
//! | [`RecordingPointer`]| cursor visibility, grab, lock and warp targets   |
//! | [`RecordingWindow`] | title, full-screen flag, size requests, redraws  |

#![warn(clippy::all)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::arithmetic_side_effects)]

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_graphics::prelude::*;

pub use hostview::keymap::usage;
pub use hostview::{
    startup, Controller, DisplayHandle, DisplayListener, GuestInputEvent, HostButton, HostEvent,
    PointerControl, Surface, ViewConfig, WindowControl,
};

fn lock<T>(shared: &Mutex<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Input sink ──────────────────────────────────────────────────────────────

/// Input sink that keeps every event it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<GuestInputEvent>>>,
}

impl RecordingSink {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything received so far
    pub fn take(&self) -> Vec<GuestInputEvent> {
        std::mem::take(&mut *lock(&self.events))
    }

    /// Number of events waiting in the log
    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl hostview::InputSink for RecordingSink {
    fn send(&mut self, event: GuestInputEvent) {
        lock(&self.events).push(event);
    }
}

// ── Pointer ─────────────────────────────────────────────────────────────────

/// Host pointer state as last set by the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerState {
    /// Host cursor shown
    pub visible: bool,
    /// Host cursor confined to the window
    pub grabbed: bool,
    /// Grab locked the cursor in place
    pub locked: bool,
    /// Every warp target, oldest first
    pub warps: Vec<Point>,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            visible: true,
            grabbed: false,
            locked: false,
            warps: Vec::new(),
        }
    }
}

/// Pointer control that records instead of touching a real cursor
#[derive(Debug, Clone, Default)]
pub struct RecordingPointer {
    state: Arc<Mutex<PointerState>>,
    lock_on_grab: bool,
}

impl RecordingPointer {
    /// Pointer whose grabs lock it in place, as on platforms without
    /// confinement; motion then has to arrive as raw deltas
    pub fn locking() -> Self {
        Self {
            lock_on_grab: true,
            ..Self::default()
        }
    }

    /// Snapshot of the recorded state
    pub fn state(&self) -> PointerState {
        lock(&self.state).clone()
    }
}

impl PointerControl for RecordingPointer {
    fn set_cursor_visible(&mut self, visible: bool) {
        lock(&self.state).visible = visible;
    }

    fn set_cursor_grab(&mut self, grab: bool) -> bool {
        let mut state = lock(&self.state);
        state.grabbed = grab;
        state.locked = grab && self.lock_on_grab;
        state.locked
    }

    fn warp_pointer(&mut self, position: Point) -> bool {
        lock(&self.state).warps.push(position);
        true
    }
}

// ── Window ──────────────────────────────────────────────────────────────────

/// Window state as last set by the bridge
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowState {
    /// Current title
    pub title: String,
    /// Borderless full screen active
    pub full_screen: bool,
    /// Every logical size requested, oldest first
    pub size_requests: Vec<Size>,
    /// Redraws requested since the last [`RecordingWindow::take_redraws`]
    pub redraws: usize,
    /// Close requested
    pub closed: bool,
}

/// Window control that records instead of touching a real window.
///
/// Size requests are applied synchronously at `scale_factor`.
#[derive(Debug, Clone)]
pub struct RecordingWindow {
    state: Arc<Mutex<WindowState>>,
    monitor: Option<Size>,
    scale_factor: f64,
}

impl RecordingWindow {
    /// Window on a monitor of `monitor` physical pixels
    pub fn new(monitor: Option<Size>, scale_factor: f64) -> Self {
        Self {
            state: Arc::default(),
            monitor,
            scale_factor,
        }
    }

    /// Snapshot of the recorded state
    pub fn state(&self) -> WindowState {
        lock(&self.state).clone()
    }

    /// Redraw count since the previous call
    pub fn take_redraws(&self) -> usize {
        std::mem::take(&mut lock(&self.state).redraws)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn to_physical(&self, size: Size) -> Size {
        let scale = |v: u32| (f64::from(v) * self.scale_factor).round().max(1.0) as u32;
        Size::new(scale(size.width), scale(size.height))
    }
}

impl WindowControl for RecordingWindow {
    fn request_inner_size(&mut self, size: Size) -> Option<Size> {
        lock(&self.state).size_requests.push(size);
        Some(self.to_physical(size))
    }

    fn set_full_screen(&mut self, full_screen: bool) {
        lock(&self.state).full_screen = full_screen;
    }

    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut lock(&self.state).title);
    }

    fn request_redraw(&mut self) {
        let mut state = lock(&self.state);
        state.redraws = state.redraws.saturating_add(1);
    }

    fn request_close(&mut self) {
        lock(&self.state).closed = true;
    }

    fn monitor_size(&self) -> Option<Size> {
        self.monitor
    }
}

// ── Bridge ──────────────────────────────────────────────────────────────────

/// Default monitor for [`TestBridge::new`]
pub const TEST_MONITOR: Size = Size::new(1920, 1080);

/// A headless bridge with a guest surface already installed.
///
/// Derefs to the [`Controller`], so every controller method is available
/// directly.
pub struct TestBridge {
    controller: Controller,
    display: DisplayHandle,
    sink: RecordingSink,
    pointer: RecordingPointer,
    window: RecordingWindow,
    mouse: Point,
}

impl TestBridge {
    /// Bridge with the default configuration and a `width`×`height` guest
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_config(ViewConfig::DEFAULT, width, height)
    }

    /// Bridge with `config` and a `width`×`height` guest on [`TEST_MONITOR`]
    pub fn with_config(config: ViewConfig, width: u32, height: u32) -> Self {
        Self::with_pointer(config, RecordingPointer::default(), width, height)
    }

    /// Like [`TestBridge::with_config`], with a caller-supplied pointer
    pub fn with_pointer(
        config: ViewConfig,
        pointer: RecordingPointer,
        width: u32,
        height: u32,
    ) -> Self {
        let scale = config.scale_factor;
        let window = RecordingWindow::new(Some(TEST_MONITOR), scale);
        Self::build(config, pointer, window, width, height)
    }

    fn build(
        config: ViewConfig,
        pointer: RecordingPointer,
        window: RecordingWindow,
        width: u32,
        height: u32,
    ) -> Self {
        let (signal, wait) = startup::channel();
        let sink = RecordingSink::new();
        let controller = Controller::new(
            config,
            signal,
            Box::new(sink.clone()),
            Box::new(pointer.clone()),
            Box::new(window.clone()),
        );
        // The signal fired inside Controller::new
        #[allow(clippy::expect_used)]
        let display = wait.wait().expect("controller signals startup");

        let mut bridge = Self {
            controller,
            display,
            sink,
            pointer,
            window,
            mouse: Point::zero(),
        };
        if let Ok(surface) = Surface::new(width, height) {
            bridge.display.switch_surface(surface);
            bridge.controller.process_notices();
        }
        bridge
    }

    // ── Collaborators ───────────────────────────────────────────────────────

    /// Producer-side handle, as the emulation thread would hold it
    pub fn display(&self) -> &DisplayHandle {
        &self.display
    }

    /// Recorded host pointer state
    pub fn pointer(&self) -> PointerState {
        self.pointer.state()
    }

    /// Recorded window state
    pub fn window(&self) -> WindowState {
        self.window.state()
    }

    /// Redraws requested since the previous call
    pub fn take_redraws(&self) -> usize {
        self.window.take_redraws()
    }

    /// Drain the guest input log
    pub fn take_events(&self) -> Vec<GuestInputEvent> {
        self.sink.take()
    }

    /// Whether the pointer is grabbed
    pub fn is_grabbed(&self) -> bool {
        self.controller.view().translator().is_grabbed()
    }

    // ── Input simulation ────────────────────────────────────────────────────

    /// Deliver one host event, returning whether the bridge handled it
    pub fn send(&mut self, event: HostEvent) -> bool {
        self.controller.handle_event(event)
    }

    /// Press and release key `code`
    pub fn tap(&mut self, code: u8) {
        self.send(HostEvent::KeyDown {
            code,
            repeat: false,
        });
        self.send(HostEvent::KeyUp { code });
    }

    /// Hold `modifiers`, tap `code`, then release the modifiers in reverse
    pub fn chord(&mut self, modifiers: &[u8], code: u8) {
        for &modifier in modifiers {
            self.send(HostEvent::KeyDown {
                code: modifier,
                repeat: false,
            });
        }
        self.tap(code);
        for &modifier in modifiers.iter().rev() {
            self.send(HostEvent::KeyUp { code: modifier });
        }
    }

    /// Host pointer moved to `position` (view coordinates)
    pub fn move_to(&mut self, position: Point) -> bool {
        self.mouse = position;
        self.send(HostEvent::MouseMoved { position })
    }

    /// Host pointer moved by `(dx, dy)` from where it last was.
    ///
    /// While grabbed in relative mode the bridge warps the pointer back to
    /// the view centre after each move, so the next move starts there.
    pub fn move_by(&mut self, dx: i32, dy: i32) -> bool {
        let origin = match self.pointer.state().warps.last() {
            Some(&warp) if self.is_grabbed() => warp,
            _ => self.mouse,
        };
        self.move_to(origin + Point::new(dx, dy))
    }

    /// Raw device motion, as delivered while the pointer is locked
    pub fn nudge(&mut self, dx: f64, dy: f64) -> bool {
        self.send(HostEvent::MouseDelta { dx, dy })
    }

    /// Press and release the primary button
    pub fn click(&mut self) {
        self.send(HostEvent::ButtonDown(HostButton::Primary));
        self.send(HostEvent::ButtonUp(HostButton::Primary));
    }

    /// Run one host refresh tick after applying producer notices
    pub fn tick(&mut self) {
        self.controller.process_notices();
        self.controller.refresh();
    }

    // ── Frame access ────────────────────────────────────────────────────────

    /// Paint the view into a fresh `0RGB` buffer of its physical size
    pub fn paint_frame(&self) -> (Vec<u32>, Size) {
        let size = self.controller.view().physical_size();
        let len = usize::try_from(size.width)
            .unwrap_or(0)
            .saturating_mul(usize::try_from(size.height).unwrap_or(0));
        let mut frame = vec![0; len];
        self.controller.paint(&mut frame, size);
        (frame, size)
    }

    /// Painted pixel at view position `(x, y)`, `None` when out of bounds
    pub fn painted_pixel(&self, x: u32, y: u32) -> Option<u32> {
        let (frame, size) = self.paint_frame();
        if x >= size.width || y >= size.height {
            return None;
        }
        let index = usize::try_from(u64::from(y) * u64::from(size.width) + u64::from(x)).ok()?;
        frame.get(index).copied()
    }
}

impl Deref for TestBridge {
    type Target = Controller;

    fn deref(&self) -> &Controller {
        &self.controller
    }
}

impl DerefMut for TestBridge {
    fn deref_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }
}
