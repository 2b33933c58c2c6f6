//! Producer-side handle to the view
//!
//! [`DisplayHandle`] is what the emulation thread holds. It implements
//! [`DisplayListener`]: surface and cursor data go straight into the shared
//! [`SurfaceStore`], and a [`DisplayNotice`] is queued for the UI thread,
//! which drains them in [`Controller::process_notices`](crate::Controller::process_notices).
//!
//! Pending notices are coalesced by kind: at most one of each is waiting at
//! any time, so a fast producer cannot grow the queue between two UI
//! iterations. They drain in a fixed order (resize, cursor change, update,
//! mouse move, refresh), so a mode switch is applied before the update that
//! repaints it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_graphics::primitives::Rectangle;
use platform::{CursorImage, DisplayListener, Surface};

use crate::renderer::union;
use crate::surface_store::{MousePosition, SurfaceStore};

/// Wakes the UI thread after a notice is queued
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Change reported by the producer, applied by the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayNotice {
    /// Guest pixels in the region changed
    Update(Rectangle),
    /// Guest switched display mode
    Resize {
        /// New guest width
        width: u32,
        /// New guest height
        height: u32,
    },
    /// Refresh tick
    Refresh,
    /// Cursor image or visibility changed
    CursorChanged,
    /// Guest cursor moved
    MouseMoved {
        /// Position before the move
        previous: MousePosition,
        /// Position after the move
        current: MousePosition,
    },
}

/// One slot per notice kind
#[derive(Debug, Default)]
struct Pending {
    resize: Option<(u32, u32)>,
    cursor_changed: bool,
    update: Option<Rectangle>,
    mouse: Option<(MousePosition, MousePosition)>,
    refresh: bool,
}

impl Pending {
    fn merge(&mut self, notice: DisplayNotice) {
        match notice {
            DisplayNotice::Update(region) => {
                self.update = Some(self.update.map_or(region, |pending| union(pending, region)));
            }
            DisplayNotice::Resize { width, height } => self.resize = Some((width, height)),
            DisplayNotice::Refresh => self.refresh = true,
            DisplayNotice::CursorChanged => self.cursor_changed = true,
            DisplayNotice::MouseMoved { previous, current } => {
                // Keep the oldest origin so the whole trail gets repainted
                let origin = self.mouse.map_or(previous, |(first, _)| first);
                self.mouse = Some((origin, current));
            }
        }
    }

    fn take(&mut self) -> Vec<DisplayNotice> {
        let Pending {
            resize,
            cursor_changed,
            update,
            mouse,
            refresh,
        } = std::mem::take(self);

        let mut notices = Vec::new();
        if let Some((width, height)) = resize {
            notices.push(DisplayNotice::Resize { width, height });
        }
        if cursor_changed {
            notices.push(DisplayNotice::CursorChanged);
        }
        if let Some(region) = update {
            notices.push(DisplayNotice::Update(region));
        }
        if let Some((previous, current)) = mouse {
            notices.push(DisplayNotice::MouseMoved { previous, current });
        }
        if refresh {
            notices.push(DisplayNotice::Refresh);
        }
        notices
    }
}

/// Cloneable producer handle to one view
#[derive(Clone)]
pub struct DisplayHandle {
    store: Arc<SurfaceStore>,
    pending: Arc<Mutex<Pending>>,
    waker: Option<Waker>,
}

impl DisplayHandle {
    /// Create a handle over `store` with no waker
    pub fn new(store: Arc<SurfaceStore>) -> Self {
        Self {
            store,
            pending: Arc::default(),
            waker: None,
        }
    }

    /// Call `waker` after every queued notice
    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = Some(waker);
        self
    }

    /// Shared surface store
    pub fn store(&self) -> &Arc<SurfaceStore> {
        &self.store
    }

    /// Install a new guest surface.
    ///
    /// Queues a resize when the dimensions changed, then a full update. The
    /// queue stays locked across the install, so once the new surface is
    /// visible to readers its resize is visible in the queue too.
    pub fn switch_surface(&self, surface: Surface) {
        let size = surface.size();
        let bounds = surface.bounding_box();
        {
            let mut pending = self.lock();
            if self.store.update_surface(Some(surface)) {
                pending.merge(DisplayNotice::Resize {
                    width: size.width,
                    height: size.height,
                });
            }
            pending.merge(DisplayNotice::Update(bounds));
        }
        self.wake();
    }

    /// Write guest pixels in place under the store lock.
    ///
    /// Returns `None` when no surface is installed. Call
    /// [`DisplayListener::notify_update`] afterwards for the touched region.
    pub fn with_surface_mut<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> Option<R> {
        self.store.with_surface_mut(f)
    }

    /// Take every pending notice, in application order
    pub fn drain_notices(&self) -> Vec<DisplayNotice> {
        self.lock().take()
    }

    /// Whether a mode switch is queued and not yet applied
    pub fn resize_pending(&self) -> bool {
        self.lock().resize.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, notice: DisplayNotice) {
        self.lock().merge(notice);
        self.wake();
    }

    fn wake(&self) {
        if let Some(wake) = &self.waker {
            wake();
        }
    }
}

impl DisplayListener for DisplayHandle {
    fn notify_update(&self, region: Rectangle) {
        self.push(DisplayNotice::Update(region));
    }

    fn notify_resize(&self, width: u32, height: u32) {
        self.push(DisplayNotice::Resize { width, height });
    }

    fn notify_refresh(&self) {
        self.push(DisplayNotice::Refresh);
    }

    fn notify_cursor_change(&self, image: Option<CursorImage>, show: bool) {
        if show && image.is_none() {
            tracing::warn!("cursor shown without an image, overlay disabled");
        }
        self.store.set_cursor(image, show);
        self.push(DisplayNotice::CursorChanged);
    }

    fn notify_mouse_position(&self, x: i32, y: i32, visible: bool) {
        let previous = self.store.set_mouse(x, y, visible);
        let current = MousePosition { x, y, on: visible };
        if previous != current {
            self.push(DisplayNotice::MouseMoved { previous, current });
        }
    }
}
