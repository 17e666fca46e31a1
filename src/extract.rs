//! Recover the first balanced JSON object from noisy model text.
//!
//! Models asked for "ONLY valid JSON" still wrap their answer in prose,
//! markdown fences, or trailing commentary often enough that feeding the raw
//! response to a JSON parser fails on good data. This scanner finds the first
//! `{`, tracks brace depth, and treats everything inside double-quoted
//! strings (honoring backslash escapes) as opaque, so braces inside string
//! values never perturb the depth count. The exact substring is returned the
//! moment depth returns to zero.

use crate::error::GenerationError;

/// Extract the substring spanning the first top-level balanced `{...}`.
///
/// Fails with a classified [`GenerationError::MalformedJson`] when the text
/// contains no `{` at all, or when the depth never returns to zero
/// (unbalanced object, e.g. a truncated response).
pub fn extract_first_json_object(raw: &str) -> Result<&str, GenerationError> {
    let start = raw.find('{').ok_or_else(|| GenerationError::MalformedJson {
        detail: "no JSON object found in model output".into(),
    })?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Ok(&raw[start..end]);
                }
            }
            _ => {}
        }
    }

    Err(GenerationError::MalformedJson {
        detail: "unbalanced JSON object in model output".into(),
    })
}
