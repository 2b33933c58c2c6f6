//! Isolated window management layer
//!
//! Based on the softbuffer pattern: <https://github.com/rust-windowing/softbuffer>.
//! Everything that touches winit lives here; the rest of the crate sees the
//! window only through [`PointerControl`] and [`WindowControl`].

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use platform::InputSink;
use softbuffer::{Context, Rect, Surface};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{
    DeviceEvent, DeviceId, ElementState, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowId};

use crate::config::ViewConfig;
use crate::controller::Controller;
use crate::display::Waker;
use crate::error::BridgeError;
use crate::geometry::DEFAULT_GUEST_SIZE;
use crate::keymap;
use crate::renderer::union;
use crate::startup::StartupSignal;
use crate::translator::{HostButton, HostEvent, PointerControl};
use crate::view::WindowControl;

/// Host refresh tick; also the boundary for staged pointer-mode changes
const REFRESH_INTERVAL: Duration = Duration::from_millis(16);

/// Pixels of trackpad scroll per wheel line
const PIXELS_PER_LINE: f64 = 20.0;

/// Producer woke the event loop
#[derive(Debug, Clone, Copy)]
struct Wake;

fn window_error(err: impl std::fmt::Display) -> BridgeError {
    BridgeError::Window(err.to_string())
}

fn to_size(size: PhysicalSize<u32>) -> Size {
    Size::new(size.width, size.height)
}

/// Open the window and run the event loop until it closes.
///
/// Must be called on the main thread. The emulation side waits on the
/// [`StartupWait`](crate::startup::StartupWait) paired with `signal`; if the
/// window cannot be created the signal is dropped and that wait fails with
/// [`BridgeError::StartupAborted`].
pub fn run(
    config: ViewConfig,
    signal: StartupSignal,
    sink: Box<dyn InputSink>,
) -> Result<(), BridgeError> {
    let event_loop = EventLoop::<Wake>::with_user_event()
        .build()
        .map_err(window_error)?;
    let mut app = App {
        config,
        signal: Some(signal),
        sink: Some(sink),
        proxy: event_loop.create_proxy(),
        running: None,
        error: None,
    };
    event_loop.run_app(&mut app).map_err(window_error)?;
    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    surface: Surface<Arc<Window>, Arc<Window>>,
    controller: Controller,
    /// Drawing-buffer region changed since the last present
    damage: Option<Rectangle>,
    /// Present the whole buffer next time (resize, rescale, relayout)
    full_frame: bool,
    /// Content rectangle at the last present
    presented: Rectangle,
}

struct App {
    config: ViewConfig,
    signal: Option<StartupSignal>,
    sink: Option<Box<dyn InputSink>>,
    proxy: EventLoopProxy<Wake>,
    running: Option<Running>,
    error: Option<BridgeError>,
}

impl App {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running, BridgeError> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title())
            .with_inner_size(LogicalSize::new(
                DEFAULT_GUEST_SIZE.width,
                DEFAULT_GUEST_SIZE.height,
            ));
        let window = Arc::new(event_loop.create_window(attributes).map_err(window_error)?);
        let context = Context::new(window.clone()).map_err(window_error)?;
        let surface = Surface::new(&context, window.clone()).map_err(window_error)?;

        let (Some(signal), Some(sink)) = (self.signal.take(), self.sink.take()) else {
            return Err(BridgeError::Window("window host started twice".to_owned()));
        };

        let proxy = Mutex::new(self.proxy.clone());
        let waker: Waker = Arc::new(move || {
            if let Ok(proxy) = proxy.lock() {
                // Fails only once the loop has exited
                let _ = proxy.send_event(Wake);
            }
        });

        let mut controller = Controller::with_waker(
            self.config.clone(),
            signal,
            sink,
            Box::new(WinitPointer {
                window: window.clone(),
            }),
            Box::new(WinitWindow {
                window: window.clone(),
            }),
            Some(waker),
        );
        let view = controller.view_mut();
        view.set_scale_factor(window.scale_factor());
        view.set_physical_size(to_size(window.inner_size()));
        view.resize_window();

        tracing::debug!(scale = window.scale_factor(), "window created");
        Ok(Running {
            window,
            surface,
            controller,
            damage: None,
            full_frame: true,
            presented: Rectangle::zero(),
        })
    }
}

impl ApplicationHandler<Wake> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(running) = &mut self.running {
            running.controller.resume();
            return;
        }
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(err) => {
                tracing::error!(error = %err, "failed to open display window");
                self.error = Some(err);
                // Dropping the signal aborts the waiting producer
                self.signal = None;
                event_loop.exit();
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &mut self.running {
            running.controller.suspend();
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device: DeviceId,
        event: DeviceEvent,
    ) {
        let (Some(running), DeviceEvent::MouseMotion { delta: (dx, dy) }) =
            (&mut self.running, event)
        else {
            return;
        };
        running
            .controller
            .handle_event(HostEvent::MouseDelta { dx, dy });
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, _event: Wake) {
        if let Some(running) = &mut self.running {
            running.controller.process_notices();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(Running {
            window,
            surface,
            controller,
            damage,
            full_frame,
            presented,
        }) = &mut self.running
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                controller.view_mut().set_physical_size(to_size(size));
                *full_frame = true;
                window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                controller.view_mut().set_scale_factor(scale_factor);
                *full_frame = true;
            }
            WindowEvent::RedrawRequested => {
                let size = window.inner_size();
                let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                else {
                    return;
                };
                if let Err(err) = surface.resize(w, h) {
                    tracing::warn!(error = %err, "surface resize failed");
                    return;
                }
                match surface.buffer_mut() {
                    Ok(mut buffer) => {
                        controller.paint(&mut buffer, to_size(size));
                        let content = controller.view().renderer().content_rect();
                        // Margins move with the content rectangle
                        let full = std::mem::take(full_frame) || content != *presented;
                        *presented = content;
                        let region = damage.take().and_then(damage_rect);
                        let result = match region {
                            Some(rect) if !full => buffer.present_with_damage(&[rect]),
                            _ => buffer.present(),
                        };
                        if let Err(err) = result {
                            tracing::warn!(error = %err, "present failed");
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "no frame buffer"),
                }
            }
            other => {
                if let Some(host) = host_event(other) {
                    controller.handle_event(host);
                }
                if controller.quit_requested() {
                    event_loop.exit();
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(running) = &mut self.running {
            running.controller.process_notices();
            running.controller.refresh();
            if let Some(region) = running.controller.view_mut().take_damage() {
                running.damage = Some(
                    running
                        .damage
                        .map_or(region, |pending| union(pending, region)),
                );
                running.window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::wait_duration(REFRESH_INTERVAL));
    }
}

/// Drawing-buffer damage as a softbuffer rectangle, `None` when empty
fn damage_rect(region: Rectangle) -> Option<Rect> {
    Some(Rect {
        x: u32::try_from(region.top_left.x).ok()?,
        y: u32::try_from(region.top_left.y).ok()?,
        width: NonZeroU32::new(region.size.width)?,
        height: NonZeroU32::new(region.size.height)?,
    })
}

/// Translate a winit event into the bridge's own vocabulary
fn host_event(event: WindowEvent) -> Option<HostEvent> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            let PhysicalKey::Code(code) = event.physical_key else {
                return None;
            };
            let code = keymap::usage_for(code)?;
            Some(match event.state {
                ElementState::Pressed => HostEvent::KeyDown {
                    code,
                    repeat: event.repeat,
                },
                ElementState::Released => HostEvent::KeyUp { code },
            })
        }
        WindowEvent::CursorMoved { position, .. } => {
            // Window coordinates always fit an i32
            #[allow(clippy::cast_possible_truncation)]
            let position = Point::new(position.x.round() as i32, position.y.round() as i32);
            Some(HostEvent::MouseMoved { position })
        }
        WindowEvent::MouseInput { state, button, .. } => {
            let button = match button {
                MouseButton::Left => HostButton::Primary,
                MouseButton::Right => HostButton::Secondary,
                MouseButton::Middle => HostButton::Middle,
                MouseButton::Back => HostButton::Side,
                MouseButton::Forward => HostButton::Extra,
                MouseButton::Other(_) => return None,
            };
            Some(match state {
                ElementState::Pressed => HostEvent::ButtonDown(button),
                ElementState::Released => HostEvent::ButtonUp(button),
            })
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let dy = match delta {
                MouseScrollDelta::LineDelta(_, y) => f64::from(y),
                MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_LINE,
            };
            Some(HostEvent::Wheel { dy })
        }
        WindowEvent::Focused(false) => Some(HostEvent::FocusLost),
        WindowEvent::Focused(true) => Some(HostEvent::FocusGained),
        _ => None,
    }
}

struct WinitPointer {
    window: Arc<Window>,
}

impl PointerControl for WinitPointer {
    fn set_cursor_visible(&mut self, visible: bool) {
        self.window.set_cursor_visible(visible);
    }

    fn set_cursor_grab(&mut self, grab: bool) -> bool {
        if !grab {
            if let Err(err) = self.window.set_cursor_grab(CursorGrabMode::None) {
                tracing::warn!(error = %err, "cursor release failed");
            }
            return false;
        }
        // Confined is unsupported on macOS, Locked on X11
        if self.window.set_cursor_grab(CursorGrabMode::Confined).is_ok() {
            return false;
        }
        match self.window.set_cursor_grab(CursorGrabMode::Locked) {
            Ok(()) => {
                tracing::debug!("pointer locked, using raw motion");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "cursor grab failed");
                false
            }
        }
    }

    fn warp_pointer(&mut self, position: Point) -> bool {
        self.window
            .set_cursor_position(PhysicalPosition::new(position.x, position.y))
            .is_ok()
    }
}

struct WinitWindow {
    window: Arc<Window>,
}

impl WindowControl for WinitWindow {
    fn request_inner_size(&mut self, size: Size) -> Option<Size> {
        self.window
            .request_inner_size(LogicalSize::new(size.width, size.height))
            .map(to_size)
    }

    fn set_full_screen(&mut self, full_screen: bool) {
        self.window
            .set_fullscreen(full_screen.then_some(Fullscreen::Borderless(None)));
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn request_redraw(&mut self) {
        self.window.request_redraw();
    }

    fn request_close(&mut self) {
        self.window.set_visible(false);
    }

    fn monitor_size(&self) -> Option<Size> {
        self.window.current_monitor().map(|monitor| to_size(monitor.size()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn damage_rect_drops_empty_and_negative_regions() {
        let rect = damage_rect(Rectangle::new(Point::new(242, 2), Size::new(3, 3))).unwrap();
        assert_eq!((rect.x, rect.y), (242, 2));
        assert_eq!((rect.width.get(), rect.height.get()), (3, 3));
        assert!(damage_rect(Rectangle::zero()).is_none());
        assert!(damage_rect(Rectangle::new(Point::new(-1, 0), Size::new(3, 3))).is_none());
    }
}
