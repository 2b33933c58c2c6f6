//! Bridge errors
//!
//! Only startup failures are fatal. Everything that can go wrong while
//! running (no surface yet, stale regions, a bad cursor bitmap) degrades
//! silently and resolves on the next refresh tick.

/// Errors surfaced by the display bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The UI side went away before signalling that the view exists
    #[error("display front-end shut down before startup completed")]
    StartupAborted,
    /// Host window or drawing surface could not be created
    #[error("window system error: {0}")]
    Window(String),
    /// Configuration could not be parsed
    #[error("invalid view configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// Screenshot export failed
    #[error("screenshot failed: {0}")]
    Screenshot(#[from] image::ImageError),
    /// Operation needs a guest surface but none is installed yet
    #[error("no guest surface installed")]
    NoSurface,
}
