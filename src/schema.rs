//! Per-variant slide recognition and content-shape rules.
//!
//! Recognition is structural: a parsed JSON value either matches exactly one
//! slide variant (discriminated by its required `type` field, with every
//! required field present as a non-empty string or array of non-empty
//! strings) or it matches nothing. Unknown `type` values, missing fields,
//! and wrong field types all mean "not a slide"; the collection-level
//! validator turns that into the recoverable `invalid_slide_types` failure.
//!
//! Content-shape rules are layered on top of structural validity and are the
//! acceptance boundary for "generated too verbose": exceeding any ceiling is
//! a terminal rejection, never a truncation.

use crate::error::GenerationError;
use crate::post::{CtaVariant, ExplanationVariant, FlowVariant, HeroVariant, StructuredSlide};
use serde_json::Value;

/// Hero titles may use at most this many words.
const HERO_TITLE_MAX_WORDS: usize = 8;
/// Hero subtitles may use at most this many words.
const HERO_SUBTITLE_MAX_WORDS: usize = 12;
/// Flow slides carry between 3 and 6 steps.
const FLOW_STEPS: std::ops::RangeInclusive<usize> = 3..=6;
/// Each flow step may use at most this many words.
const FLOW_STEP_MAX_WORDS: usize = 6;
/// Explanation slides carry between 2 and 3 points.
const EXPLANATION_POINTS: std::ops::RangeInclusive<usize> = 2..=3;
/// Each explanation point may use at most this many words.
const EXPLANATION_POINT_MAX_WORDS: usize = 14;
/// Cta text may span at most this many non-empty lines.
const CTA_MAX_LINES: usize = 2;

fn non_empty_string(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(non_empty_string(item)?.to_string());
    }
    Some(out)
}

fn variant_tag<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
    // An unknown or mistyped variant tag is presentation metadata, not
    // structure: drop it and let the renderer default.
    value
        .get("variant")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Classify a parsed value as exactly one slide variant, or reject it.
///
/// For `explanation` slides the `highlight` list is filtered during
/// construction: entries that do not occur (case-insensitively) as a
/// substring of at least one point are silently dropped. A missing or
/// mistyped `highlight` field is treated as empty for the same reason: the
/// list is advisory styling, not structure.
pub fn recognize_slide(value: &Value) -> Option<StructuredSlide> {
    let object = value.as_object()?;
    let slide_type = object.get("type")?.as_str()?;

    match slide_type {
        "hero" => Some(StructuredSlide::Hero {
            variant: variant_tag::<HeroVariant>(value),
            title: non_empty_string(object.get("title")?)?.to_string(),
            subtitle: non_empty_string(object.get("subtitle")?)?.to_string(),
        }),
        "flow" => Some(StructuredSlide::Flow {
            variant: variant_tag::<FlowVariant>(value),
            steps: string_list(object.get("steps")?)?,
        }),
        "explanation" => {
            let points = string_list(object.get("points")?)?;
            let highlight = object
                .get("highlight")
                .and_then(string_list)
                .unwrap_or_default();
            let highlight = filter_highlights(&points, highlight);
            Some(StructuredSlide::Explanation {
                variant: variant_tag::<ExplanationVariant>(value),
                title: non_empty_string(object.get("title")?)?.to_string(),
                points,
                highlight,
            })
        }
        "cta" => Some(StructuredSlide::Cta {
            variant: variant_tag::<CtaVariant>(value),
            text: non_empty_string(object.get("text")?)?.to_string(),
        }),
        "paragraph" => Some(StructuredSlide::Paragraph {
            title: non_empty_string(object.get("title")?)?.to_string(),
            text: non_empty_string(object.get("text")?)?.to_string(),
        }),
        "diagram" => Some(StructuredSlide::Diagram {
            title: non_empty_string(object.get("title")?)?.to_string(),
            nodes: string_list(object.get("nodes")?)?,
        }),
        _ => None,
    }
}

/// Keep only highlights that occur, case-insensitively, in some point.
fn filter_highlights(points: &[String], highlight: Vec<String>) -> Vec<String> {
    let lowered: Vec<String> = points.iter().map(|p| p.to_lowercase()).collect();
    highlight
        .into_iter()
        .filter(|h| {
            let needle = h.to_lowercase();
            lowered.iter().any(|p| p.contains(&needle))
        })
        .collect()
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn has_terminal_punctuation(step: &str) -> bool {
    matches!(step.trim_end().chars().last(), Some('.' | '!' | '?'))
}

/// Check one recognized slide against the per-variant content ceilings.
///
/// `position` is 1-based and only used for error reporting.
pub fn check_slide_shape(slide: &StructuredSlide, position: usize) -> Result<(), GenerationError> {
    let fail = |detail: String| {
        Err(GenerationError::SlideContent { position, detail })
    };

    match slide {
        StructuredSlide::Hero { title, subtitle, .. } => {
            if word_count(title) > HERO_TITLE_MAX_WORDS {
                return fail(format!(
                    "hero title has {} words (max {HERO_TITLE_MAX_WORDS})",
                    word_count(title)
                ));
            }
            if word_count(subtitle) > HERO_SUBTITLE_MAX_WORDS {
                return fail(format!(
                    "hero subtitle has {} words (max {HERO_SUBTITLE_MAX_WORDS})",
                    word_count(subtitle)
                ));
            }
            Ok(())
        }
        StructuredSlide::Flow { steps, .. } => {
            if !FLOW_STEPS.contains(&steps.len()) {
                return fail(format!("flow has {} steps (expected 3-6)", steps.len()));
            }
            for step in steps {
                if word_count(step) > FLOW_STEP_MAX_WORDS {
                    return fail(format!(
                        "flow step {step:?} has {} words (max {FLOW_STEP_MAX_WORDS})",
                        word_count(step)
                    ));
                }
                if has_terminal_punctuation(step) {
                    return fail(format!("flow step {step:?} ends with sentence punctuation"));
                }
            }
            Ok(())
        }
        StructuredSlide::Explanation { points, .. } => {
            if !EXPLANATION_POINTS.contains(&points.len()) {
                return fail(format!(
                    "explanation has {} points (expected 2-3)",
                    points.len()
                ));
            }
            for point in points {
                if word_count(point) > EXPLANATION_POINT_MAX_WORDS {
                    return fail(format!(
                        "explanation point {point:?} has {} words (max {EXPLANATION_POINT_MAX_WORDS})",
                        word_count(point)
                    ));
                }
            }
            Ok(())
        }
        StructuredSlide::Cta { text, .. } => {
            let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
            if lines > CTA_MAX_LINES {
                return fail(format!("cta text has {lines} lines (max {CTA_MAX_LINES})"));
            }
            Ok(())
        }
        // Extended variants carry no word-count ceilings; structural
        // non-emptiness was already enforced by recognition.
        StructuredSlide::Paragraph { .. } | StructuredSlide::Diagram { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognizes_each_variant() {
        let values = [
            json!({"type": "hero", "title": "T", "subtitle": "S"}),
            json!({"type": "flow", "steps": ["Parse", "Validate", "Render"]}),
            json!({"type": "explanation", "title": "Why", "points": ["a", "b"], "highlight": []}),
            json!({"type": "cta", "text": "Follow along"}),
            json!({"type": "paragraph", "title": "T", "text": "body"}),
            json!({"type": "diagram", "title": "T", "nodes": ["in", "out"]}),
        ];
        let expected = ["hero", "flow", "explanation", "cta", "paragraph", "diagram"];
        for (value, want) in values.iter().zip(expected) {
            let slide = recognize_slide(value).expect("should recognize");
            assert_eq!(slide.type_name(), want);
        }
    }

    #[test]
    fn unknown_type_and_missing_fields_reject() {
        assert!(recognize_slide(&json!({"type": "banner", "title": "x"})).is_none());
        assert!(recognize_slide(&json!({"type": "hero", "title": "only"})).is_none());
        assert!(recognize_slide(&json!({"type": "hero", "title": " ", "subtitle": "s"})).is_none());
        assert!(recognize_slide(&json!({"type": "flow", "steps": ["ok", 42]})).is_none());
        assert!(recognize_slide(&json!(["not", "an", "object"])).is_none());
    }

    #[test]
    fn unknown_variant_tag_is_dropped_not_rejected() {
        let slide =
            recognize_slide(&json!({"type": "hero", "variant": "sideways", "title": "T", "subtitle": "S"}))
                .unwrap();
        match slide {
            StructuredSlide::Hero { variant, .. } => assert!(variant.is_none()),
            other => panic!("expected hero, got {}", other.type_name()),
        }
    }

    #[test]
    fn highlight_entries_without_a_matching_point_are_dropped() {
        let slide = recognize_slide(&json!({
            "type": "explanation",
            "title": "Lessons",
            "points": ["Systems are hard", "Latency matters"],
            "highlight": ["hard", "nonexistent"]
        }))
        .unwrap();
        match slide {
            StructuredSlide::Explanation { highlight, .. } => {
                assert_eq!(highlight, vec!["hard"]);
            }
            other => panic!("expected explanation, got {}", other.type_name()),
        }
    }

    #[test]
    fn highlight_matching_is_case_insensitive() {
        let slide = recognize_slide(&json!({
            "type": "explanation",
            "title": "T",
            "points": ["Ship Early", "Measure twice"],
            "highlight": ["SHIP", "Twice"]
        }))
        .unwrap();
        match slide {
            StructuredSlide::Explanation { highlight, .. } => {
                assert_eq!(highlight, vec!["SHIP", "Twice"]);
            }
            other => panic!("expected explanation, got {}", other.type_name()),
        }
    }

    #[test]
    fn missing_highlight_field_means_empty() {
        let slide = recognize_slide(&json!({
            "type": "explanation",
            "title": "T",
            "points": ["a", "b"]
        }))
        .unwrap();
        match slide {
            StructuredSlide::Explanation { highlight, .. } => assert!(highlight.is_empty()),
            other => panic!("expected explanation, got {}", other.type_name()),
        }
    }

    #[test]
    fn hero_word_ceilings() {
        let ok = StructuredSlide::Hero {
            variant: None,
            title: "One two three four five six seven eight".into(),
            subtitle: "s".into(),
        };
        assert!(check_slide_shape(&ok, 1).is_ok());

        let too_long = StructuredSlide::Hero {
            variant: None,
            title: "One two three four five six seven eight nine".into(),
            subtitle: "s".into(),
        };
        let err = check_slide_shape(&too_long, 1).unwrap_err();
        assert_eq!(err.code(), "slide_content");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn flow_step_rules() {
        let wrong_count = StructuredSlide::Flow {
            variant: None,
            steps: vec!["a".into(), "b".into()],
        };
        assert!(check_slide_shape(&wrong_count, 2).is_err());

        let punctuated = StructuredSlide::Flow {
            variant: None,
            steps: vec!["Extract text".into(), "Validate output".into(), "Render slides.".into()],
        };
        let err = check_slide_shape(&punctuated, 2).unwrap_err();
        assert!(err.to_string().contains("punctuation"));

        let ok = StructuredSlide::Flow {
            variant: None,
            steps: vec!["Extract text".into(), "Validate output".into(), "Render slides".into()],
        };
        assert!(check_slide_shape(&ok, 2).is_ok());
    }

    #[test]
    fn cta_line_ceiling() {
        let ok = StructuredSlide::Cta {
            variant: None,
            text: "Enjoyed this?\nFollow for more".into(),
        };
        assert!(check_slide_shape(&ok, 10).is_ok());

        let too_many = StructuredSlide::Cta {
            variant: None,
            text: "One\nTwo\nThree".into(),
        };
        assert!(check_slide_shape(&too_many, 10).is_err());
    }

    #[test]
    fn explanation_point_rules() {
        let too_many_points = StructuredSlide::Explanation {
            variant: None,
            title: "T".into(),
            points: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            highlight: vec![],
        };
        assert!(check_slide_shape(&too_many_points, 3).is_err());

        let wordy = StructuredSlide::Explanation {
            variant: None,
            title: "T".into(),
            points: vec![
                "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen"
                    .into(),
                "short".into(),
            ],
            highlight: vec![],
        };
        assert!(check_slide_shape(&wordy, 3).is_err());
    }
}
