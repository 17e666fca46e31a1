//! Output validation: raw model text → [`StructuredPostOutput`] or a
//! classified [`GenerationError`].
//!
//! The validator runs a fixed sequence of passes, each with its own failure
//! class so the orchestrator can tell recoverable shape problems from
//! terminal business-rule violations:
//!
//! 1. Parse the extracted substring as JSON: `malformed_json`
//! 2. Require `slides` (array), `caption` (string), `hashtags` (array of
//!    strings): `missing_field`
//! 3. Recognize every slide element; any element matching no variant is
//!    `invalid_slide_types` (highlight filtering happens inside recognition
//!    and is a silent repair, never a failure)
//! 4. Per-slide content ceilings: `slide_content`
//! 5. Caption: non-empty, at most 6 blank-line paragraphs
//! 6. Hashtags: normalize, then enforce the 8–15 band and `#`-prefix rule
//! 7. Whole-sequence structure: count, hero-first, cta-last, no anchors in
//!    the body, flow placement in a strict 10-slide sequence
//!
//! Validation is all-or-nothing: no partial post is ever returned.

use crate::error::GenerationError;
use crate::extract::extract_first_json_object;
use crate::hashtags::{normalize_hashtags, MAX_HASHTAGS, MIN_HASHTAGS};
use crate::post::{PostTheme, StructuredPostOutput, StructuredSlide, POST_BACKGROUND_PALETTE};
use crate::schema::{check_slide_shape, recognize_slide};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Captions may have at most this many blank-line-delimited paragraphs.
pub const MAX_CAPTION_PARAGRAPHS: usize = 6;

static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Convenience wrapper: extract the first JSON object from raw model text,
/// then validate it.
pub fn validate_model_response(
    raw: &str,
    max_slides: usize,
) -> Result<StructuredPostOutput, GenerationError> {
    let json = extract_first_json_object(raw)?;
    validate_model_output(json, max_slides)
}

/// Validate an extracted JSON substring against the post schema.
pub fn validate_model_output(
    json: &str,
    max_slides: usize,
) -> Result<StructuredPostOutput, GenerationError> {
    // ── 1. Parse ─────────────────────────────────────────────────────────
    let value: Value =
        serde_json::from_str(json).map_err(|e| GenerationError::MalformedJson {
            detail: e.to_string(),
        })?;

    // ── 2. Top-level shape ───────────────────────────────────────────────
    let slides_value = value
        .get("slides")
        .and_then(Value::as_array)
        .ok_or(GenerationError::MissingField { field: "slides" })?;
    let caption_value = value
        .get("caption")
        .and_then(Value::as_str)
        .ok_or(GenerationError::MissingField { field: "caption" })?;
    let hashtags_value = value
        .get("hashtags")
        .and_then(Value::as_array)
        .ok_or(GenerationError::MissingField { field: "hashtags" })?;
    let raw_hashtags: Vec<String> = hashtags_value
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<_>>()
        .ok_or(GenerationError::MissingField { field: "hashtags" })?;

    // ── 3. Slide recognition ─────────────────────────────────────────────
    let recognized: Vec<Option<StructuredSlide>> =
        slides_value.iter().map(recognize_slide).collect();
    let unrecognized = recognized.iter().filter(|s| s.is_none()).count();
    if unrecognized > 0 {
        return Err(GenerationError::InvalidSlideTypes {
            total: slides_value.len(),
            unrecognized,
        });
    }
    let slides: Vec<StructuredSlide> = recognized.into_iter().flatten().collect();

    // ── 4. Per-slide content ceilings ────────────────────────────────────
    for (index, slide) in slides.iter().enumerate() {
        check_slide_shape(slide, index + 1)?;
    }

    // ── 5. Caption ───────────────────────────────────────────────────────
    let caption = caption_value.trim().to_string();
    if caption.is_empty() {
        return Err(GenerationError::CaptionEmpty);
    }
    let paragraphs = RE_PARAGRAPH_BREAK.split(&caption).count();
    if paragraphs > MAX_CAPTION_PARAGRAPHS {
        return Err(GenerationError::CaptionParagraphs {
            paragraphs,
            max: MAX_CAPTION_PARAGRAPHS,
        });
    }

    // ── 6. Hashtags ──────────────────────────────────────────────────────
    let hashtags = normalize_hashtags(&raw_hashtags, MAX_HASHTAGS);
    if hashtags.len() < MIN_HASHTAGS || hashtags.len() > MAX_HASHTAGS {
        return Err(GenerationError::HashtagCount {
            count: hashtags.len(),
            min: MIN_HASHTAGS,
            max: MAX_HASHTAGS,
        });
    }
    for tag in &hashtags {
        if !tag.starts_with('#') || tag.contains('\n') || tag.contains('\r') {
            return Err(GenerationError::HashtagFormat { tag: tag.clone() });
        }
    }

    // ── 7. Whole-sequence structure ──────────────────────────────────────
    check_sequence(&slides, max_slides)?;

    // ── Theme ────────────────────────────────────────────────────────────
    let theme = explicit_theme(&value).unwrap_or_else(|| derive_theme(&slides));
    debug!(
        slides = slides.len(),
        hashtags = hashtags.len(),
        background = %theme.background_color,
        "validated model output"
    );

    Ok(StructuredPostOutput {
        slides,
        theme,
        caption,
        hashtags,
    })
}

/// Structural checks across the whole slide sequence.
fn check_sequence(slides: &[StructuredSlide], max_slides: usize) -> Result<(), GenerationError> {
    if slides.is_empty() || slides.len() > max_slides {
        return Err(GenerationError::SlideCount {
            max: max_slides,
            actual: slides.len(),
        });
    }

    let first = &slides[0];
    if !first.is_hero() {
        return Err(GenerationError::HeroNotFirst {
            got: first.type_name().to_string(),
        });
    }

    let last = &slides[slides.len() - 1];
    if !last.is_cta() {
        return Err(GenerationError::CtaNotLast {
            got: last.type_name().to_string(),
        });
    }

    for (index, slide) in slides.iter().enumerate().skip(1) {
        if index == slides.len() - 1 {
            break;
        }
        if slide.is_hero() || slide.is_cta() {
            return Err(GenerationError::AnchorInBody {
                position: index + 1,
                got: slide.type_name().to_string(),
            });
        }
    }

    // Narrative placement only binds the strict full-length schema: a
    // 10-slide sequence must put a flow slide somewhere in slides 4-6.
    if slides.len() == 10 && !slides[3..6].iter().any(StructuredSlide::is_flow) {
        return Err(GenerationError::FlowPlacement);
    }

    Ok(())
}

/// Accept an explicit theme only when it names a palette color.
///
/// Anything else (absent theme, wrong shape, off-palette color) falls
/// through to deterministic derivation.
fn explicit_theme(value: &Value) -> Option<PostTheme> {
    let color = value.get("theme")?.get("backgroundColor")?.as_str()?;
    POST_BACKGROUND_PALETTE
        .iter()
        .find(|c| **c == color)
        .map(|c| PostTheme {
            background_color: c.to_string(),
        })
}

/// Deterministically derive a theme from slide content.
///
/// The seed is each slide's content fragment in order; the hash is the
/// 32-bit wrapping polynomial `h = h*31 + code_unit` over UTF-16 code units,
/// and the palette index is `abs(h) mod palette_size`. Bit-reproducible
/// across platforms and runs.
pub fn derive_theme(slides: &[StructuredSlide]) -> PostTheme {
    let mut seed = String::new();
    for slide in slides {
        slide.push_seed_text(&mut seed);
    }
    let index = (seed_hash(&seed) as i64).unsigned_abs() as usize;
    PostTheme::from_palette_index(index % POST_BACKGROUND_PALETTE.len())
}

fn seed_hash(seed: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in seed.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    hash
}
