//! Request and rendering configuration types.
//!
//! [`GenerationRequest`] is the immutable per-request input to the
//! generation orchestrator; construction clamps the slide-count ceiling and
//! nothing mutates it afterwards. [`RenderOptions`] collects the rendering
//! knobs, built via its [`RenderOptionsBuilder`] so callers set only what
//! they care about and rely on documented defaults for the rest.

use crate::error::AssemblyError;
use serde::{Deserialize, Serialize};

/// Default tone used when the caller passes a blank tone string.
pub const DEFAULT_TONE: &str = "conversational but professional";

/// Hard ceiling on the number of slides a post may have.
pub const MAX_SLIDES: usize = 10;

/// Default number of concurrent render calls.
///
/// Rendering one slide ties up one headless-browser page on the collaborator
/// side; two in flight overlaps render latency without exhausting a small
/// browser pool.
pub const DEFAULT_RENDER_CONCURRENCY: usize = 2;

/// Input to one generation attempt. Immutable once constructed.
///
/// Only the constructor can set fields, so the slide-count clamp cannot be
/// bypassed after the fact.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    text: String,
    max_slides: usize,
    tone: String,
    branding_footer: Option<String>,
}

impl GenerationRequest {
    /// Build a request. `max_slides` is clamped to `1..=10`; a blank tone
    /// falls back to [`DEFAULT_TONE`] at prompt-build time.
    ///
    /// Minimum input length is the caller's concern; the text-extraction
    /// boundary enforces it before this core runs.
    pub fn new(text: impl Into<String>, max_slides: usize) -> Self {
        Self {
            text: text.into(),
            max_slides: max_slides.clamp(1, MAX_SLIDES),
            tone: String::new(),
            branding_footer: None,
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn with_branding_footer(mut self, footer: impl Into<String>) -> Self {
        self.branding_footer = Some(footer.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The clamped slide-count ceiling for this request.
    pub fn max_slides(&self) -> usize {
        self.max_slides
    }

    /// The tone to embed in the prompt, defaulted when blank.
    pub fn effective_tone(&self) -> &str {
        let trimmed = self.tone.trim();
        if trimmed.is_empty() {
            DEFAULT_TONE
        } else {
            trimmed
        }
    }

    /// Branding footer, if one was supplied and is non-blank.
    pub fn branding_footer(&self) -> Option<&str> {
        self.branding_footer
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

/// Named output size configuration.
///
/// A preset fixes the render viewport and, for the paginated document
/// artifact, the page size in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPreset {
    /// 1080×1080 square, the classic carousel format.
    #[default]
    Square,
    /// 1200×1500 portrait, sized for LinkedIn document posts.
    LinkedIn,
}

impl RenderPreset {
    /// Pixel dimensions of one rendered slide.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            RenderPreset::Square => (1080, 1080),
            RenderPreset::LinkedIn => (1200, 1500),
        }
    }

    /// Viewport handed to the external render collaborator.
    pub fn viewport(self) -> Viewport {
        let (width, height) = self.dimensions();
        Viewport { width, height }
    }

    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            RenderPreset::Square => "square",
            RenderPreset::LinkedIn => "linkedin",
        }
    }
}

/// Pixel viewport for one slide render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Options for the rendering-and-assembly pipeline.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Output size preset. Default: [`RenderPreset::Square`].
    pub preset: RenderPreset,

    /// Number of concurrent render calls. Default: 2.
    ///
    /// The worker pool never has more than this many render calls in flight;
    /// completion order is unconstrained and the assembler's reorder buffer
    /// restores slide order.
    pub concurrency: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            preset: RenderPreset::default(),
            concurrency: DEFAULT_RENDER_CONCURRENCY,
        }
    }
}

impl RenderOptions {
    pub fn builder() -> RenderOptionsBuilder {
        RenderOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`RenderOptions`].
#[derive(Debug)]
pub struct RenderOptionsBuilder {
    options: RenderOptions,
}

impl RenderOptionsBuilder {
    pub fn preset(mut self, preset: RenderPreset) -> Self {
        self.options.preset = preset;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.options.concurrency = n.max(1);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<RenderOptions, AssemblyError> {
        if self.options.concurrency == 0 {
            return Err(AssemblyError::Archive("concurrency must be >= 1".into()));
        }
        Ok(self.options)
    }
}
