//! View configuration
//!
//! Read-only inputs supplied by the surrounding application. The bridge never
//! writes these back; preference persistence lives outside this crate.

use serde::Deserialize;

use crate::error::BridgeError;

/// Configuration for the host view
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    /// Scale the guest display to fit the window, preserving aspect ratio
    pub zoom_to_fit: bool,
    /// Bilinear filtering when zoomed (nearest-neighbour otherwise)
    pub zoom_interpolation: bool,
    /// Start in full-screen mode
    pub full_screen: bool,
    /// Host display scale (backing pixels per logical pixel)
    pub scale_factor: f64,
    /// While grabbed, send host shortcuts to the guest as well
    pub full_grab: bool,
    /// Swap the Alt and GUI (Command / Super) keys before forwarding
    pub swap_option_command: bool,
    /// Keep the host pointer visible while the mouse is grabbed
    pub show_cursor: bool,
    /// Window title prefix
    pub title: String,
}

impl ViewConfig {
    /// Default configuration: 1:1 window, no zoom, host shortcuts enabled
    pub const DEFAULT: Self = Self {
        zoom_to_fit: false,
        zoom_interpolation: false,
        full_screen: false,
        scale_factor: 1.0,
        full_grab: false,
        swap_option_command: false,
        show_cursor: false,
        title: String::new(),
    };

    /// Zoom-to-fit with bilinear filtering
    pub const ZOOM_TO_FIT: Self = Self {
        zoom_to_fit: true,
        zoom_interpolation: true,
        full_screen: false,
        scale_factor: 1.0,
        full_grab: false,
        swap_option_command: false,
        show_cursor: false,
        title: String::new(),
    };

    /// Parse a JSON configuration; missing fields fall back to [`ViewConfig::DEFAULT`]
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.sanitize();
        Ok(config)
    }

    /// Window title, falling back to the crate name
    pub fn title(&self) -> &str {
        if self.title.is_empty() {
            "hostview"
        } else {
            &self.title
        }
    }

    fn sanitize(&mut self) {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            tracing::warn!(
                scale_factor = self.scale_factor,
                "ignoring invalid scale factor"
            );
            self.scale_factor = 1.0;
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
