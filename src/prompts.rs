//! Prompt construction for carousel generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: the rule set the model is asked to follow
//!    mirrors the rule set the validator enforces; changing either means
//!    editing exactly one place on each side.
//!
//! 2. **Testability**: unit tests can inspect the prompt directly without a
//!    live model, so contract regressions (a dropped rule, a broken footer
//!    instruction) are caught cheaply.
//!
//! The prompt text is a collaborator-facing artifact: nothing here validates
//! it, and the validator never trusts the model to have obeyed it.

use crate::config::GenerationRequest;

/// The schema example embedded in every generation prompt.
const SCHEMA_EXAMPLE: &str = r##"{"slides":[{"type":"hero","title":"...","subtitle":"..."},{"type":"flow","steps":["..."]},{"type":"explanation","title":"...","points":["..."],"highlight":["..."]},{"type":"cta","text":"..."}],"caption":"...","hashtags":["#tag"]}"##;

/// Appended to the prompt for the single corrective retry.
///
/// Used when the first response failed with a recoverable shape error
/// (malformed JSON, missing field, unrecognized slide types).
pub const STRICT_RETRY_SUFFIX: &str =
    "\nIMPORTANT: Your previous answer could not be parsed. Return ONLY the JSON object, no extra keys, no commentary, no markdown fences.";

/// Build the generation prompt for one request.
///
/// Embeds the tone, the branding-footer instruction, and the full structural
/// rule set as explicit natural-language constraints.
pub fn build_carousel_prompt(request: &GenerationRequest) -> String {
    let max_slides = request.max_slides();
    let tone = request.effective_tone();
    let footer_rule = match request.branding_footer() {
        Some(footer) => format!(
            "Include this exact branding footer sentence at the end of the caption: {footer:?}."
        ),
        None => "Do not add any branding footer.".to_string(),
    };

    let lines: Vec<String> = vec![
        "You are generating carousel copy for a social post.".into(),
        "Return ONLY valid JSON.".into(),
        "Do not include markdown.".into(),
        "Do not include code fences.".into(),
        "Do not include explanations.".into(),
        "Do not include any text outside the JSON object.".into(),
        "The JSON must match this exact schema:".into(),
        SCHEMA_EXAMPLE.into(),
        "Rules:".into(),
        format!("- Maximum slides: {max_slides} (never exceed 10)."),
        "- At least 1 slide.".into(),
        "- Slide 1 must be a hero slide with a strong hook.".into(),
        "- The last slide must be a cta slide with a clear call-to-action.".into(),
        "- Hero and cta slides are only allowed at those two positions.".into(),
        "- Place a flow slide among slides 4 to 6.".into(),
        "- Hero title: at most 8 words. Hero subtitle: at most 12 words.".into(),
        "- Flow: 3 to 6 steps, each at most 6 words, no sentence punctuation.".into(),
        "- Explanation: 2 to 3 points, each at most 14 words.".into(),
        "- Explanation highlight entries must quote a substring of a point.".into(),
        "- Cta text: at most 2 lines.".into(),
        "- Caption: at most 6 paragraphs.".into(),
        "- Hashtags: 8 to 15 items, each starting with '#', no line breaks.".into(),
        "- No emojis.".into(),
        format!("- Tone: {tone:?}."),
        "- No trailing commas.".into(),
        footer_rule,
        "Input text:".into(),
        request.text().to_string(),
    ];

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_ceiling_tone_and_input() {
        let request = GenerationRequest::new("Borrow checking in practice", 7).with_tone("playful");
        let prompt = build_carousel_prompt(&request);
        assert!(prompt.contains("Maximum slides: 7"));
        assert!(prompt.contains("\"playful\""));
        assert!(prompt.ends_with("Borrow checking in practice"));
        assert!(prompt.contains("\"type\":\"hero\""));
    }

    #[test]
    fn footer_rule_switches_on_presence() {
        let without = build_carousel_prompt(&GenerationRequest::new("t", 10));
        assert!(without.contains("Do not add any branding footer."));

        let with = build_carousel_prompt(
            &GenerationRequest::new("t", 10).with_branding_footer("Made by Acme"),
        );
        assert!(with.contains("exact branding footer"));
        assert!(with.contains("\"Made by Acme\""));
    }

    #[test]
    fn retry_suffix_demands_bare_json() {
        assert!(STRICT_RETRY_SUFFIX.contains("ONLY the JSON object"));
        assert!(STRICT_RETRY_SUFFIX.contains("no extra keys"));
    }
}
