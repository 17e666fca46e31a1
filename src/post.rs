//! Output data model: the slide union, theme palette, and the validated post.
//!
//! [`StructuredSlide`] is a closed sum type. Every consumer (the schema
//! recognizers, the markup builder, the theme seeding) matches on it
//! exhaustively, so adding a variant is a compile-time-enforced, single-point
//! change rather than a runtime `default:` branch waiting to throw.
//!
//! A [`StructuredPostOutput`] only ever comes out of
//! [`crate::validate::validate_model_output`] and is never mutated afterwards;
//! highlight filtering happens while the slide is constructed, not later.

use serde::{Deserialize, Serialize};

/// Background colors a post theme may use.
///
/// The palette is fixed: theme derivation indexes into it deterministically,
/// and explicit themes are only accepted when they name one of these values.
pub const POST_BACKGROUND_PALETTE: [&str; 7] = [
    "#0f172a", "#111827", "#0b1324", "#0a1b2a", "#111b2e", "#0b1f1a", "#1a1026",
];

/// Returns true if `color` is one of [`POST_BACKGROUND_PALETTE`].
pub fn is_palette_color(color: &str) -> bool {
    POST_BACKGROUND_PALETTE.contains(&color)
}

/// Visual theme for a whole post. All slides of a post share one background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTheme {
    pub background_color: String,
}

impl PostTheme {
    /// Theme for a palette index; the index is taken modulo the palette size.
    pub fn from_palette_index(index: usize) -> Self {
        Self {
            background_color: POST_BACKGROUND_PALETTE[index % POST_BACKGROUND_PALETTE.len()]
                .to_string(),
        }
    }
}

/// Presentation variant for a hero slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeroVariant {
    #[default]
    Default,
    Center,
}

/// Presentation variant for a flow slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowVariant {
    #[default]
    Default,
    Grid,
}

/// Presentation variant for an explanation slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationVariant {
    #[default]
    Default,
    Cards,
}

/// Presentation variant for a call-to-action slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CtaVariant {
    #[default]
    Default,
    Minimal,
}

/// One slide of a carousel post.
///
/// The `variant` tag on each member is optional presentation metadata; the
/// markup builder substitutes the variant's `Default` when it is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StructuredSlide {
    Hero {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant: Option<HeroVariant>,
        title: String,
        subtitle: String,
    },
    Flow {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant: Option<FlowVariant>,
        steps: Vec<String>,
    },
    Explanation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant: Option<ExplanationVariant>,
        title: String,
        points: Vec<String>,
        #[serde(default)]
        highlight: Vec<String>,
    },
    Cta {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant: Option<CtaVariant>,
        text: String,
    },
    Paragraph {
        title: String,
        text: String,
    },
    Diagram {
        title: String,
        nodes: Vec<String>,
    },
}

impl StructuredSlide {
    /// The wire name of this slide's type, as it appears in generated JSON.
    pub fn type_name(&self) -> &'static str {
        match self {
            StructuredSlide::Hero { .. } => "hero",
            StructuredSlide::Flow { .. } => "flow",
            StructuredSlide::Explanation { .. } => "explanation",
            StructuredSlide::Cta { .. } => "cta",
            StructuredSlide::Paragraph { .. } => "paragraph",
            StructuredSlide::Diagram { .. } => "diagram",
        }
    }

    pub fn is_hero(&self) -> bool {
        matches!(self, StructuredSlide::Hero { .. })
    }

    pub fn is_cta(&self) -> bool {
        matches!(self, StructuredSlide::Cta { .. })
    }

    pub fn is_flow(&self) -> bool {
        matches!(self, StructuredSlide::Flow { .. })
    }

    /// Append this slide's contribution to the theme derivation seed.
    ///
    /// The fragment is built from the slide's text content only; presentation
    /// variants are deliberately excluded so that re-styling a post never
    /// changes its derived background.
    pub fn push_seed_text(&self, seed: &mut String) {
        match self {
            StructuredSlide::Hero { title, subtitle, .. } => {
                seed.push_str(title);
                seed.push_str(subtitle);
            }
            StructuredSlide::Flow { steps, .. } => {
                for step in steps {
                    seed.push_str(step);
                }
            }
            StructuredSlide::Explanation { title, points, .. } => {
                seed.push_str(title);
                for point in points {
                    seed.push_str(point);
                }
            }
            StructuredSlide::Cta { text, .. } => seed.push_str(text),
            StructuredSlide::Paragraph { title, text } => {
                seed.push_str(title);
                seed.push_str(text);
            }
            StructuredSlide::Diagram { title, nodes } => {
                seed.push_str(title);
                for node in nodes {
                    seed.push_str(node);
                }
            }
        }
        seed.push('\n');
    }
}

/// A fully validated carousel post, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredPostOutput {
    pub slides: Vec<StructuredSlide>,
    pub theme: PostTheme,
    pub caption: String,
    pub hashtags: Vec<String>,
}
