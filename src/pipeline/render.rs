//! The external render collaborator boundary.
//!
//! Pixel rendering is not this crate's business: a [`SlideRenderer`] takes
//! one slide's markup plus a viewport and returns encoded image bytes,
//! however it wants to produce them (headless browser, screenshot service,
//! test double). Calls are assumed stateless; a failure for any slide is
//! terminal for the whole batch, surfaced through the worker pool.
//!
//! No cancellation token is threaded through: when the batch fails, any
//! in-flight render is the collaborator's responsibility to reclaim.

use crate::config::Viewport;
use crate::error::AssemblyError;
use crate::pipeline::markup::SlideMarkup;
use async_trait::async_trait;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Failure of the external render collaborator.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RenderCallError {
    pub message: String,
}

impl RenderCallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External render collaborator: slide markup + viewport in, image bytes out.
#[async_trait]
pub trait SlideRenderer: Send + Sync {
    async fn render(
        &self,
        markup: &SlideMarkup,
        viewport: Viewport,
    ) -> Result<Vec<u8>, RenderCallError>;
}

/// Render one slide, classifying collaborator failures by slide position.
pub async fn render_slide(
    renderer: &dyn SlideRenderer,
    index: usize,
    markup: &SlideMarkup,
    viewport: Viewport,
) -> Result<Vec<u8>, AssemblyError> {
    let start = Instant::now();
    let bytes = renderer
        .render(markup, viewport)
        .await
        .map_err(|e| AssemblyError::RenderFailed {
            position: index + 1,
            detail: e.message,
        })?;
    debug!(
        slide = index + 1,
        bytes = bytes.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "slide rendered"
    );
    Ok(bytes)
}
