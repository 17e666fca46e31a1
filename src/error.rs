//! Error types for the text2carousel library.
//!
//! Two distinct error types reflect the two pipelines:
//!
//! * [`GenerationError`]: everything that can go wrong between raw model
//!   text and a validated [`crate::post::StructuredPostOutput`]. Each variant
//!   is one classified failure with a stable [`GenerationError::code`], and
//!   [`GenerationError::is_recoverable`] encodes the fixed set of failures
//!   the orchestrator may spend its single retry on.
//!
//! * [`AssemblyError`]: failures while rendering slides and packaging the
//!   artifact (archive or document). Never retried; a pool-wide failure is
//!   terminal for that batch.
//!
//! The recoverable set is hand-enumerated on purpose: malformed JSON, a
//! missing top-level field, and unrecognized slide types are *shape* problems
//! a stricter follow-up prompt can fix. Business-rule violations mean the
//! model produced well-formed but non-compliant output, and a fixed retry
//! budget should not be spent guessing at a fix.

use thiserror::Error;

/// Classified failures of the generation-and-validation pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    // ── Recoverable shape failures (drive the single retry) ───────────────
    /// The model response contained no parseable JSON object.
    #[error("malformed JSON in model output: {detail}")]
    MalformedJson { detail: String },

    /// The top-level object is missing `slides`, `caption`, or `hashtags`
    /// (or the field has the wrong JSON type).
    #[error("model output is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// At least one slide element matched no known slide variant.
    #[error("{unrecognized} of {total} slide elements matched no known slide type")]
    InvalidSlideTypes { total: usize, unrecognized: usize },

    // ── Terminal business-rule violations ─────────────────────────────────
    /// Slide count is zero or exceeds the effective ceiling.
    #[error("slide count {actual} is outside the allowed range 1..={max}")]
    SlideCount { max: usize, actual: usize },

    /// The first slide is not a hero.
    #[error("slide 1 must be a hero slide, got '{got}'")]
    HeroNotFirst { got: String },

    /// The last slide is not a call-to-action.
    #[error("the last slide must be a cta slide, got '{got}'")]
    CtaNotLast { got: String },

    /// A hero or cta slide appeared in the interior of the sequence.
    #[error("slide {position} is a '{got}' slide; hero and cta are only allowed at the edges")]
    AnchorInBody { position: usize, got: String },

    /// A strict 10-slide sequence has no flow slide in positions 4–6.
    #[error("no flow slide in positions 4-6 of a 10-slide sequence")]
    FlowPlacement,

    /// A recognized slide violates one of the per-variant content ceilings.
    #[error("slide {position} breaks a content rule: {detail}")]
    SlideContent { position: usize, detail: String },

    /// Caption is empty after trimming.
    #[error("caption is empty")]
    CaptionEmpty,

    /// Caption has more than the allowed number of blank-line paragraphs.
    #[error("caption has {paragraphs} paragraphs; at most {max} are allowed")]
    CaptionParagraphs { paragraphs: usize, max: usize },

    /// Hashtag count after normalization is outside the allowed band.
    #[error("{count} hashtags after normalization; expected {min}..={max}")]
    HashtagCount { count: usize, min: usize, max: usize },

    /// A hashtag is missing its '#' prefix or contains a line break.
    #[error("hashtag {tag:?} is not a single '#'-prefixed line")]
    HashtagFormat { tag: String },

    // ── Collaborator failures ─────────────────────────────────────────────
    /// The model call itself failed (transport, auth, quota). Never retried.
    #[error("generation failed: {detail}")]
    ModelCall { detail: String },
}

impl GenerationError {
    /// Short machine-checkable code for this failure class.
    ///
    /// Stable across releases; boundary layers key user-facing messages and
    /// metrics off these instead of parsing `Display` output.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::MalformedJson { .. } => "malformed_json",
            GenerationError::MissingField { .. } => "missing_field",
            GenerationError::InvalidSlideTypes { .. } => "invalid_slide_types",
            GenerationError::SlideCount { .. } => "slide_count",
            GenerationError::HeroNotFirst { .. } => "hero_not_first",
            GenerationError::CtaNotLast { .. } => "cta_not_last",
            GenerationError::AnchorInBody { .. } => "anchor_in_body",
            GenerationError::FlowPlacement => "flow_placement",
            GenerationError::SlideContent { .. } => "slide_content",
            GenerationError::CaptionEmpty => "caption_empty",
            GenerationError::CaptionParagraphs { .. } => "caption_paragraphs",
            GenerationError::HashtagCount { .. } => "hashtag_count",
            GenerationError::HashtagFormat { .. } => "hashtag_format",
            GenerationError::ModelCall { .. } => "model_call",
        }
    }

    /// Whether the orchestrator may spend its single retry on this failure.
    ///
    /// The set is frozen: exactly malformed JSON, missing required field,
    /// and invalid slide types. Everything else is terminal on first
    /// occurrence, including transport failures of the model call.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GenerationError::MalformedJson { .. }
                | GenerationError::MissingField { .. }
                | GenerationError::InvalidSlideTypes { .. }
        )
    }
}

/// Failures of the rendering-and-assembly pipeline.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Assembly was invoked with an empty slide sequence.
    #[error("slides are required")]
    NoSlides,

    /// A slide reached the assembler in a shape the markup builder rejects
    /// (e.g. a flow slide with zero or more than six steps).
    #[error("slide {position} cannot be rendered: {detail}")]
    InvalidSlide { position: usize, detail: String },

    /// The external render collaborator failed for one slide; terminal for
    /// the whole batch.
    #[error("render failed for slide {position}: {detail}")]
    RenderFailed { position: usize, detail: String },

    /// Writing the zip archive failed.
    #[error("archive write failed: {0}")]
    Archive(String),

    /// Building the paginated document failed.
    #[error("document build failed: {0}")]
    Document(String),

    /// Rendered bytes for a slide could not be decoded as an image.
    #[error("slide {position} produced undecodable image bytes: {detail}")]
    BadImage { position: usize, detail: String },
}
