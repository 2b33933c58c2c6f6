//! Host display-and-input bridge for a machine emulator
//!
//! Owns the on-screen rendering surface, turns host keyboard and pointer
//! events into neutral guest input, and runs the mouse-grab and
//! full-screen/zoom state machines.
//!
//! - Window management (winit + softbuffer), excluded by the `headless` feature
//! - Guest frame buffer shared with the emulation thread ([`SurfaceStore`])
//! - Letterboxed zoom-to-fit ([`GeometryEngine`])
//! - Grab/release and absolute/relative pointer handling ([`InputTranslator`])
//!
//! # Threads
//!
//! The window host runs on the main thread. The emulation thread waits on
//! the startup rendezvous and then drives the view through a
//! [`DisplayHandle`].
//!
//! # Example
//!
//! ```no_run
//! use hostview::{startup, DisplayListener, InputQueue, Surface, ViewConfig};
//!
//! # #[cfg(not(feature = "headless"))]
//! # fn main() -> Result<(), hostview::BridgeError> {
//! let (signal, wait) = startup::channel();
//! let (queue, _guest_input) = InputQueue::new();
//!
//! std::thread::spawn(move || {
//!     let Ok(display) = wait.wait() else { return };
//!     if let Ok(surface) = Surface::new(640, 480) {
//!         display.switch_surface(surface);
//!     }
//!     display.notify_refresh();
//! });
//!
//! hostview::window::run(ViewConfig::ZOOM_TO_FIT, signal, Box::new(queue))
//! # }
//! # #[cfg(feature = "headless")]
//! # fn main() {}
//! ```

// Desktop crate: pixel and coordinate arithmetic is range-checked where it
// matters and saturating everywhere else.
#![allow(clippy::arithmetic_side_effects)]

pub mod config;
pub mod controller;
pub mod display;
mod error;
pub mod geometry;
pub mod input;
pub mod keymap;
pub mod renderer;
pub mod startup;
pub mod surface_store;
pub mod translator;
pub mod view;

#[cfg(not(feature = "headless"))]
pub mod window;

pub use config::ViewConfig;
pub use controller::{Controller, EventResult};
pub use display::{DisplayHandle, DisplayNotice, Waker};
pub use error::BridgeError;
pub use geometry::{GeometryEngine, ScreenGeometry};
pub use input::{GuestInput, InputQueue};
pub use renderer::Renderer;
pub use startup::{StartupSignal, StartupWait};
pub use surface_store::{MousePosition, SurfaceStore};
pub use translator::{GrabState, HostButton, HostEvent, InputTranslator, PointerControl};
pub use view::{UiInfo, View, WindowControl};

pub use platform::{
    ButtonMask, CursorImage, DisplayListener, GuestInputEvent, InputSink, KeyEvent,
    PointerAbsoluteEvent, PointerRelativeEvent, Surface,
};
