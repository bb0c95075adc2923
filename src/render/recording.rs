//! In-memory surface that records every frame.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::{RenderSurface, Renderable};
use crate::error::RenderError;

/// A frame and the instant it was drawn.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub at: Instant,
    pub frame: Renderable,
}

/// Keeps frames in a shared buffer so the caller can inspect them while
/// the engine owns the surface.
///
/// # Example
///
/// ```
/// use streamchart::render::RecordingSurface;
///
/// let surface = RecordingSurface::new();
/// let frames = surface.frames();
/// // hand `surface` to the engine, read `frames` afterwards
/// assert!(frames.lock().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    frames: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the recorded frames.
    pub fn frames(&self) -> Arc<Mutex<Vec<Recorded>>> {
        Arc::clone(&self.frames)
    }
}

impl RenderSurface for RecordingSurface {
    fn draw(&mut self, frame: &Renderable) -> Result<(), RenderError> {
        self.frames.lock().push(Recorded {
            at: Instant::now(),
            frame: frame.clone(),
        });
        Ok(())
    }
}
