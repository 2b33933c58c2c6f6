//! Top-level dispatcher
//!
//! The [`Controller`] owns the view and the UI side of the display handle.
//! It sits between the window host and the rest of the bridge: host
//! shortcuts are checked first, everything else goes to the
//! [`InputTranslator`](crate::translator::InputTranslator).
//!
//! # Host shortcuts
//!
//! | Keys       | Action                |
//! |------------|-----------------------|
//! | Ctrl+Alt+F | toggle full screen    |
//! | Ctrl+Alt+Z | toggle zoom-to-fit    |
//! | Ctrl+Alt+Q | quit                  |
//!
//! With `full_grab` set these go to the guest while the mouse is grabbed.

use std::sync::Arc;

use embedded_graphics::prelude::Size;
use platform::InputSink;

use crate::config::ViewConfig;
use crate::display::{DisplayHandle, DisplayNotice, Waker};
use crate::keymap::usage;
use crate::startup::StartupSignal;
use crate::surface_store::SurfaceStore;
use crate::translator::{HostEvent, PointerControl};
use crate::view::{View, WindowControl};

/// Result of offering an event to the host shortcut table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// A host shortcut ran
    Consumed,
    /// Not a shortcut; pass it on
    NotHandled,
}

/// Event dispatcher and lifecycle owner for one view
pub struct Controller {
    config: ViewConfig,
    view: View,
    handle: DisplayHandle,
    allow_events: bool,
    quit_requested: bool,
}

impl Controller {
    /// Build the view and release the startup rendezvous
    pub fn new(
        config: ViewConfig,
        signal: StartupSignal,
        sink: Box<dyn InputSink>,
        pointer: Box<dyn PointerControl>,
        window: Box<dyn WindowControl>,
    ) -> Self {
        Self::with_waker(config, signal, sink, pointer, window, None)
    }

    /// Like [`Controller::new`], with a waker the producer calls after each notice
    pub fn with_waker(
        config: ViewConfig,
        signal: StartupSignal,
        sink: Box<dyn InputSink>,
        pointer: Box<dyn PointerControl>,
        window: Box<dyn WindowControl>,
        waker: Option<Waker>,
    ) -> Self {
        let store = Arc::new(SurfaceStore::new());
        let mut handle = DisplayHandle::new(store.clone());
        if let Some(waker) = waker {
            handle = handle.with_waker(waker);
        }

        let mut view = View::new(&config, store, sink, pointer, window);
        if config.full_screen {
            view.set_full_screen(true);
        } else {
            view.resize_window();
        }

        signal.notify(handle.clone());
        tracing::debug!(
            zoom = config.zoom_to_fit,
            full_screen = config.full_screen,
            "controller started"
        );

        Self {
            config,
            view,
            handle,
            allow_events: true,
            quit_requested: false,
        }
    }

    /// The active view
    pub fn view(&self) -> &View {
        &self.view
    }

    /// The active view, mutably
    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    /// UI-side clone of the producer handle
    pub fn display_handle(&self) -> &DisplayHandle {
        &self.handle
    }

    /// Configuration the controller was built with
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Accept or drop host events (dropped while the host is suspended)
    pub fn set_allow_events(&mut self, allow: bool) {
        self.allow_events = allow;
    }

    /// The host suspended the application.
    ///
    /// Runs the focus-loss path (held keys and buttons released, grab
    /// dropped, title restored), then drops host events until
    /// [`Controller::resume`].
    pub fn suspend(&mut self) {
        self.handle_event(HostEvent::FocusLost);
        self.allow_events = false;
        tracing::debug!("suspended");
    }

    /// The host resumed the application
    pub fn resume(&mut self) {
        self.allow_events = true;
        tracing::debug!("resumed");
    }

    /// Whether Ctrl+Alt+Q was pressed
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Dispatch one host event.
    ///
    /// Returns `true` when the bridge handled it.
    pub fn handle_event(&mut self, event: HostEvent) -> bool {
        if !self.allow_events {
            return false;
        }
        if self.handle_shortcut(event) == EventResult::Consumed {
            return true;
        }
        self.view.handle_input(event)
    }

    /// Offer `event` to the host shortcut table
    pub fn handle_shortcut(&mut self, event: HostEvent) -> EventResult {
        let HostEvent::KeyDown { code, repeat } = event else {
            return EventResult::NotHandled;
        };
        let translator = self.view.translator();
        if !translator.ctrl_alt_held() || (self.config.full_grab && translator.is_grabbed()) {
            return EventResult::NotHandled;
        }
        match code {
            usage::F if !repeat => self.view.toggle_full_screen(),
            usage::Z if !repeat => self.view.toggle_zoom(),
            usage::Q if !repeat => {
                tracing::debug!("quit requested");
                self.quit_requested = true;
                self.view.window_mut().request_close();
            }
            usage::F | usage::Z | usage::Q => {}
            _ => return EventResult::NotHandled,
        }
        EventResult::Consumed
    }

    /// Apply every queued producer notice to the view.
    ///
    /// Returns how many were applied.
    pub fn process_notices(&mut self) -> usize {
        let notices = self.handle.drain_notices();
        for notice in &notices {
            match *notice {
                DisplayNotice::Update(region) => self.view.frame_updated(region),
                DisplayNotice::Resize { width, height } => {
                    self.view.update_screen_size(width, height);
                }
                DisplayNotice::Refresh => self.view.refresh(),
                DisplayNotice::CursorChanged => self.view.cursor_changed(),
                DisplayNotice::MouseMoved { previous, current } => {
                    self.view.mouse_moved(previous, current);
                }
            }
        }
        notices.len()
    }

    /// Host-side refresh tick
    pub fn refresh(&mut self) {
        self.view.refresh();
    }

    /// Paint the current frame into `dst`
    pub fn paint(&self, dst: &mut [u32], size: Size) -> bool {
        self.view.paint(dst, size)
    }
}
