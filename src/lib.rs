//! # text2carousel
//!
//! Turn a block of extracted document text into a validated, rendered
//! carousel post: a themed sequence of typed slides, a caption, and
//! hashtags, packaged as a zip of per-slide images or a multi-page PDF.
//!
//! ## Why this crate?
//!
//! Language models are good at drafting carousel copy and bad at respecting
//! schemas. This crate treats the model as an untrusted collaborator: its
//! raw text is defensively parsed, checked against a non-trivial structural
//! and business rule set, repaired where the rules allow, and retried
//! exactly once with a stricter instruction when the failure is a shape
//! problem. Rendering fans out across a bounded worker pool, and a reorder
//! buffer guarantees the packaged artifact preserves slide order no matter
//! how renders complete.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text
//!  │
//!  ├─ 1. Prompt    embed tone, footer rule, and the full schema contract
//!  ├─ 2. Model     external ModelClient call (retried once on shape errors)
//!  ├─ 3. Extract   recover the first balanced JSON object from noisy text
//!  ├─ 4. Validate  slide schema + caption + hashtags + sequence structure
//!  ├─ 5. Markup    one self-contained HTML document per slide
//!  ├─ 6. Render    external SlideRenderer calls, bounded concurrency
//!  └─ 7. Package   ordered zip stream, or buffered multi-page PDF
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use text2carousel::{
//!     generate_post, render_slides_to_zip, GenerationRequest, ModelClient, RenderOptions,
//!     SlideRenderer,
//! };
//!
//! # async fn run(
//! #     model: Arc<dyn ModelClient>,
//! #     renderer: Arc<dyn SlideRenderer>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let request = GenerationRequest::new("extracted document text…", 10)
//!     .with_tone("conversational but professional");
//! let post = generate_post(model.as_ref(), &request).await?;
//!
//! let zip = render_slides_to_zip(
//!     &post.slides,
//!     &post.theme,
//!     renderer,
//!     &RenderOptions::default(),
//! )
//! .await?;
//! std::fs::write("slides.zip", zip)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `text2carousel` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! text2carousel = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod adapter;
pub mod assemble;
pub mod config;
pub mod error;
pub mod extract;
pub mod generate;
pub mod hashtags;
pub mod pipeline;
pub mod post;
pub mod prompts;
pub mod schema;
pub mod stream;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use adapter::{flatten_post, FlatPostOutput, FlatSlide};
pub use assemble::render_slides_to_pdf;
pub use config::{
    GenerationRequest, RenderOptions, RenderOptionsBuilder, RenderPreset, Viewport, DEFAULT_TONE,
    MAX_SLIDES,
};
pub use error::{AssemblyError, GenerationError};
pub use extract::extract_first_json_object;
pub use generate::{generate_post, ModelCallError, ModelClient};
pub use hashtags::{normalize_hashtags, MAX_HASHTAGS, MIN_HASHTAGS};
pub use pipeline::markup::{build_slide_markup, SlideMarkup};
pub use pipeline::render::{RenderCallError, SlideRenderer};
pub use post::{
    PostTheme, StructuredPostOutput, StructuredSlide, POST_BACKGROUND_PALETTE,
};
pub use prompts::build_carousel_prompt;
pub use stream::{render_slides_to_zip, render_slides_to_zip_stream, ArchiveByteStream};
pub use validate::{derive_theme, validate_model_output, validate_model_response};
