//! Adapter from the structured slide union to flat preview slides.
//!
//! Preview surfaces and legacy consumers want a plain headline/content pair
//! per slide rather than the typed union. The mapping is lossy:
//! presentation variants and highlights are styling concerns that the flat
//! shape cannot express.

use crate::post::{StructuredPostOutput, StructuredSlide};
use serde::{Deserialize, Serialize};

/// A flat slide for preview and legacy consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatSlide {
    pub headline: String,
    pub content: String,
}

/// A flattened post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatPostOutput {
    pub slides: Vec<FlatSlide>,
    pub caption: String,
    pub hashtags: Vec<String>,
}

/// Flatten a validated post.
pub fn flatten_post(post: &StructuredPostOutput) -> FlatPostOutput {
    FlatPostOutput {
        slides: post.slides.iter().map(flatten_slide).collect(),
        caption: post.caption.clone(),
        hashtags: post.hashtags.clone(),
    }
}

fn flatten_slide(slide: &StructuredSlide) -> FlatSlide {
    match slide {
        StructuredSlide::Hero { title, subtitle, .. } => FlatSlide {
            headline: title.clone(),
            content: subtitle.clone(),
        },
        StructuredSlide::Flow { steps, .. } => FlatSlide {
            headline: "Architecture Flow".to_string(),
            content: steps.join("\n"),
        },
        StructuredSlide::Explanation { title, points, .. } => FlatSlide {
            headline: title.clone(),
            content: points.join("\n"),
        },
        StructuredSlide::Cta { text, .. } => FlatSlide {
            headline: "Final Thought".to_string(),
            content: text.clone(),
        },
        StructuredSlide::Paragraph { title, text } => FlatSlide {
            headline: title.clone(),
            content: text.clone(),
        },
        StructuredSlide::Diagram { title, nodes } => FlatSlide {
            headline: title.clone(),
            content: nodes.join("\n"),
        },
    }
}
