//! Queued delivery of guest input events.
//!
//! The translator runs on the UI thread; the emulated input devices usually
//! live on the emulation thread. This module provides the pipe between them:
//!
//! - [`InputQueue`]: producer, handed to the bridge as its [`InputSink`].
//! - [`GuestInput`]: consumer, drained by the emulation core.
//!
//! Unlike button presses, key releases must never be lost (a dropped release
//! is a stuck key in the guest), so when the queue is full the *oldest
//! pointer* event is discarded first and key events are kept.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use platform::{GuestInputEvent, InputSink};

/// Maximum number of unread events buffered in the queue.
pub const QUEUE_CAP: usize = 256;

type Shared = Arc<Mutex<VecDeque<GuestInputEvent>>>;

/// Producer half of the guest-input pipe.
#[derive(Clone)]
pub struct InputQueue {
    queue: Shared,
}

impl InputQueue {
    /// Create a linked (producer, consumer) pair.
    pub fn new() -> (Self, GuestInput) {
        let q: Shared = Arc::new(Mutex::new(VecDeque::new()));
        (InputQueue { queue: q.clone() }, GuestInput { queue: q })
    }

    /// Enqueue an event, evicting the oldest pointer event when full.
    pub fn push(&self, event: GuestInputEvent) {
        let mut q = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if q.len() >= QUEUE_CAP {
            let victim = q
                .iter()
                .position(|e| !matches!(e, GuestInputEvent::Key(_)));
            match victim {
                Some(index) => {
                    q.remove(index);
                }
                None if matches!(event, GuestInputEvent::Key(_)) => {
                    // Queue is all keys; grow rather than lose a release.
                }
                None => {
                    tracing::trace!("input queue full, dropping pointer event");
                    return;
                }
            }
        }
        q.push_back(event);
    }
}

impl InputSink for InputQueue {
    fn send(&mut self, event: GuestInputEvent) {
        self.push(event);
    }
}

/// Consumer half of the guest-input pipe.
pub struct GuestInput {
    queue: Shared,
}

impl GuestInput {
    /// Async wait: polls the queue every 5 ms until an event is available.
    pub async fn wait_for_event(&mut self) -> GuestInputEvent {
        loop {
            if let Some(e) = self.poll_event() {
                return e;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    /// Pop the oldest event without blocking.
    pub fn poll_event(&mut self) -> Option<GuestInputEvent> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Take every pending event in arrival order.
    pub fn drain(&mut self) -> Vec<GuestInputEvent> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}
