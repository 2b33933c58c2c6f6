//! The on-screen view
//!
//! [`View`] ties the pieces of one display together: the shared
//! [`SurfaceStore`], the [`GeometryEngine`] deciding where the guest image
//! goes, the [`Renderer`] painting it and the [`InputTranslator`] owning the
//! grab state. Window-system side effects go through [`WindowControl`].

use std::sync::Arc;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use platform::InputSink;

use crate::config::ViewConfig;
use crate::geometry::GeometryEngine;
use crate::renderer::{cursor_dirty_rect, Renderer};
use crate::surface_store::{MousePosition, SurfaceStore};
use crate::translator::{HostEvent, InputTranslator, PointerControl, TranslatorOptions};

/// Window-system operations the view needs, implemented by the window host
pub trait WindowControl {
    /// Ask for a new content size in logical pixels.
    ///
    /// Returns the applied physical size when the platform resized
    /// synchronously, `None` when a resize event will follow.
    fn request_inner_size(&mut self, size: Size) -> Option<Size>;

    /// Enter or leave borderless full screen
    fn set_full_screen(&mut self, full_screen: bool);

    /// Replace the window title
    fn set_title(&mut self, title: &str);

    /// Schedule a repaint
    fn request_redraw(&mut self);

    /// Close the window and stop the event loop
    fn request_close(&mut self);

    /// Physical size of the monitor hosting the window
    fn monitor_size(&self) -> Option<Size>;
}

/// Geometry of the view as reported to the display collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiInfo {
    /// Drawing-buffer width in physical pixels
    pub width: u32,
    /// Drawing-buffer height in physical pixels
    pub height: u32,
    /// Physical pixels per logical pixel
    pub scale_factor: f64,
    /// Whether the view is full screen
    pub full_screen: bool,
}

/// One guest display on screen
pub struct View {
    store: Arc<SurfaceStore>,
    geometry: GeometryEngine,
    renderer: Renderer,
    translator: InputTranslator,
    window: Box<dyn WindowControl>,
    physical: Size,
    title: String,
    shown_title: String,
}

impl View {
    /// Create a view over `store`
    pub fn new(
        config: &ViewConfig,
        store: Arc<SurfaceStore>,
        sink: Box<dyn InputSink>,
        pointer: Box<dyn PointerControl>,
        window: Box<dyn WindowControl>,
    ) -> Self {
        let geometry = GeometryEngine::new(
            config.zoom_to_fit,
            config.zoom_interpolation,
            config.scale_factor,
        );
        let translator = InputTranslator::new(
            sink,
            pointer,
            TranslatorOptions {
                swap_option_command: config.swap_option_command,
                show_cursor: config.show_cursor,
            },
        );
        let physical = geometry.compute_unzoomed_size();
        let mut view = Self {
            store,
            geometry,
            renderer: Renderer::new(config.zoom_interpolation),
            translator,
            window,
            physical,
            title: config.title().to_owned(),
            shown_title: String::new(),
        };
        view.relayout();
        view.update_title();
        view
    }

    /// Shared surface store
    pub fn store(&self) -> &Arc<SurfaceStore> {
        &self.store
    }

    /// Sizing state
    pub fn geometry(&self) -> &GeometryEngine {
        &self.geometry
    }

    /// Renderer state
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Input state
    pub fn translator(&self) -> &InputTranslator {
        &self.translator
    }

    /// Mutable input state, for grab and pointer-mode requests
    pub fn translator_mut(&mut self) -> &mut InputTranslator {
        &mut self.translator
    }

    /// Current drawing-buffer size
    pub fn physical_size(&self) -> Size {
        self.physical
    }

    /// Guest pixels inside `region` changed
    pub fn frame_updated(&mut self, region: Rectangle) {
        self.renderer.mark_dirty(region, self.geometry.screen().size());
        self.window.request_redraw();
    }

    /// The guest switched mode; resize the window if the dimensions changed.
    ///
    /// The installed surface is authoritative: a reported size that
    /// disagrees with it is ignored in favour of the surface's own.
    pub fn update_screen_size(&mut self, width: u32, height: u32) {
        let (width, height) = match self.store.dimensions() {
            Some(actual) if actual != Size::new(width, height) => {
                tracing::warn!(
                    width,
                    height,
                    actual_w = actual.width,
                    actual_h = actual.height,
                    "reported mode disagrees with surface, using surface size"
                );
                (actual.width, actual.height)
            }
            _ => (width, height),
        };
        if !self.geometry.set_screen_size(width, height) {
            return;
        }
        tracing::debug!(width, height, "guest display resized");
        self.resize_window();
        self.mark_all_dirty();
    }

    /// Size the window for the current guest mode and zoom state.
    ///
    /// Returns the requested logical size.
    pub fn resize_window(&mut self) -> Size {
        self.geometry.set_monitor_size(self.window.monitor_size());
        let size = self.geometry.resize_window();
        if !self.geometry.full_screen() {
            if let Some(applied) = self.window.request_inner_size(size) {
                self.physical = applied;
            }
        }
        self.relayout();
        size
    }

    /// The drawing buffer changed size (window resized by the user or host)
    pub fn set_physical_size(&mut self, size: Size) {
        self.physical = size;
        let logical = crate::geometry::compute_unzoomed_size(size, self.geometry.scale_factor());
        self.geometry.set_window_size(logical);
        self.relayout();
        self.mark_all_dirty();
    }

    /// The window moved to a display with a different scale
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.geometry.set_scale_factor(scale_factor);
        self.relayout();
    }

    /// Enter or leave full screen
    pub fn set_full_screen(&mut self, full_screen: bool) {
        if self.geometry.full_screen() == full_screen {
            return;
        }
        self.geometry.set_full_screen(full_screen);
        self.window.set_full_screen(full_screen);
        tracing::debug!(full_screen, "full screen");
        self.resize_window();
    }

    /// Flip full-screen mode
    pub fn toggle_full_screen(&mut self) {
        self.set_full_screen(!self.geometry.full_screen());
    }

    /// Flip zoom-to-fit and resize accordingly
    pub fn toggle_zoom(&mut self) {
        let zoom = !self.geometry.zoom_enabled();
        self.geometry.set_zoom_enabled(zoom);
        tracing::debug!(zoom, "zoom to fit");
        self.resize_window();
        self.mark_all_dirty();
    }

    /// Dim the view while the guest is stopped
    pub fn set_paused(&mut self, paused: bool) {
        if self.renderer.is_paused() == paused {
            return;
        }
        self.renderer.set_paused(paused);
        self.update_title();
        self.mark_all_dirty();
    }

    /// Size and scale of the view for the display collaborator
    pub fn ui_info(&self) -> UiInfo {
        UiInfo {
            width: self.physical.width,
            height: self.physical.height,
            scale_factor: self.geometry.scale_factor(),
            full_screen: self.geometry.full_screen(),
        }
    }

    /// The guest installed or hid its cursor.
    ///
    /// The old image's footprint is unknown by now, so the whole screen is
    /// repainted.
    pub fn cursor_changed(&mut self) {
        self.mark_all_dirty();
    }

    /// The guest cursor moved from `previous` to `current`
    pub fn mouse_moved(&mut self, previous: MousePosition, current: MousePosition) {
        let Some((cursor, hot_spot)) = self.store.cursor_extent() else {
            return;
        };
        let screen = self.geometry.screen().size();
        if let Some(region) = cursor_dirty_rect(previous, current, cursor, hot_spot, screen) {
            self.frame_updated(region);
        }
    }

    /// Route a host event to the translator, retitling on grab changes
    pub fn handle_input(&mut self, event: HostEvent) -> bool {
        let handled = self.translator.handle_event(event);
        self.update_title();
        handled
    }

    /// Refresh tick: apply staged pointer-mode changes
    pub fn refresh(&mut self) {
        if self.translator.on_refresh() {
            self.update_title();
        }
    }

    /// Paint the current frame into `dst`
    pub fn paint(&self, dst: &mut [u32], size: Size) -> bool {
        self.renderer.paint(&self.store, dst, size)
    }

    /// Drain the pending repaint region (guest coordinates)
    pub fn take_dirty(&mut self) -> Option<Rectangle> {
        self.renderer.take_dirty()
    }

    /// Drain the pending repaint region, mapped into drawing-buffer pixels
    pub fn take_damage(&mut self) -> Option<Rectangle> {
        let dirty = self.renderer.take_dirty()?;
        let damage = self
            .renderer
            .view_region(dirty, self.geometry.screen().size());
        (!damage.is_zero_sized()).then_some(damage)
    }

    pub(crate) fn window_mut(&mut self) -> &mut dyn WindowControl {
        self.window.as_mut()
    }

    fn mark_all_dirty(&mut self) {
        let screen = self.geometry.screen().size();
        self.frame_updated(Rectangle::new(Point::zero(), screen));
    }

    fn relayout(&mut self) {
        let content = self.geometry.content_rect(self.physical);
        self.renderer.relayout(self.physical, content);
        self.translator
            .set_layout(self.physical, content, self.geometry.screen().size());
    }

    fn update_title(&mut self) {
        let mut title = self.title.clone();
        if self.translator.is_grabbed() {
            title.push_str(" - Press Ctrl+Alt+G to release Mouse");
        }
        if self.renderer.is_paused() {
            title.push_str(" [Paused]");
        }
        if title != self.shown_title {
            self.window.set_title(&title);
            self.shown_title = title;
        }
    }
}
