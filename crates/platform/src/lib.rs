//! Guest-facing contracts for the hostview display bridge
//!
//! This crate holds the types shared between the emulated machine and the
//! host front-end, so either side can be developed and tested alone.
//!
//! # Architecture Layers
//!
//! ```text
//! Emulation core (display adapter, input devices)
//!         ↓ DisplayListener        ↑ InputSink
//! Platform contracts (this crate)
//!         ↓                        ↑
//! Host front-end (hostview crate)
//! ```
//!
//! # Contracts
//!
//! - [`DisplayListener`] - display-output callbacks (update, resize, refresh, cursor)
//! - [`InputSink`] - receiver for neutral [`GuestInputEvent`]s
//! - [`Surface`] / [`CursorImage`] - guest pixel containers
//!
//! # Example
//!
//! ```
//! use platform::{GuestInputEvent, InputSink, KeyEvent};
//!
//! let mut log = Vec::new();
//! let mut sink = |event: GuestInputEvent| log.push(event);
//! sink.send(GuestInputEvent::Key(KeyEvent { code: 0x04, pressed: true }));
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod display;
pub mod input;

pub use display::{CursorImage, DisplayListener, Surface, SurfaceError};
pub use input::{
    ButtonMask, GuestInputEvent, InputSink, KeyEvent, PointerAbsoluteEvent, PointerRelativeEvent,
};
