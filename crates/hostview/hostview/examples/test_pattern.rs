//! Test Pattern Example
//!
//! Opens the host view and drives it from a fake emulation thread:
//! - scrolling colour bars through `switch_surface` / `notify_update`
//! - a guest cursor that follows a circle
//! - guest input printed as it arrives
//!
//! Click to grab the mouse, Ctrl+Alt+G to release, Ctrl+Alt+Z to toggle
//! zoom, Ctrl+Alt+F for full screen, Ctrl+Alt+Q to quit.
//!
//! Run with: RUST_LOG=hostview=debug cargo run --example test_pattern

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

#[cfg(not(feature = "headless"))]
fn main() -> Result<(), hostview::BridgeError> {
    use std::time::Duration;

    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::Rectangle;
    use hostview::{startup, CursorImage, DisplayListener, InputQueue, Surface, ViewConfig};

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    const BARS: [u32; 8] = [
        0x00FF_FFFF, 0x00FF_FF00, 0x0000_FFFF, 0x0000_FF00,
        0x00FF_00FF, 0x00FF_0000, 0x0000_00FF, 0x0000_0000,
    ];
    let (width, height) = (640u32, 480u32);

    let (signal, wait) = startup::channel();
    let (queue, mut guest_input) = InputQueue::new();

    // Emulation side
    std::thread::spawn(move || {
        let display = match wait.wait() {
            Ok(display) => display,
            Err(err) => {
                tracing::error!(error = %err, "display never came up");
                return;
            }
        };
        display.switch_surface(Surface::new(width, height).unwrap());

        let arrow: Vec<u32> = (0..16u32 * 16)
            .map(|i| if i % 16 <= i / 16 { 0xFF00_0000 } else { 0 })
            .collect();
        display.notify_cursor_change(Some(CursorImage::from_pixels(16, 16, 0, 0, arrow).unwrap()), true);

        let bar_width = width / BARS.len() as u32;
        for frame in 0u32.. {
            display.with_surface_mut(|surface| {
                for (i, color) in BARS.iter().enumerate() {
                    let x = (i as u32 * bar_width + frame) % width;
                    surface.fill_rect(
                        Rectangle::new(Point::new(x as i32, 0), Size::new(bar_width, height)),
                        *color,
                    );
                }
            });
            display.notify_update(Rectangle::new(Point::zero(), Size::new(width, height)));

            let angle = f64::from(frame) / 30.0;
            let x = 320.0 + 100.0 * angle.cos();
            let y = 240.0 + 100.0 * angle.sin();
            display.notify_mouse_position(x as i32, y as i32, true);
            display.notify_refresh();

            std::thread::sleep(Duration::from_millis(33));
        }
    });

    // Input side
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            loop {
                let event = guest_input.wait_for_event().await;
                tracing::info!(?event, "guest input");
            }
        });
    });

    hostview::window::run(ViewConfig::ZOOM_TO_FIT, signal, Box::new(queue))
}

#[cfg(feature = "headless")]
fn main() {
    println!("test_pattern needs a window; build without the `headless` feature.");
}
