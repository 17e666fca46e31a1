//! Hashtag normalization: trim, deduplicate, cap.
//!
//! The normalizer never rejects, it only cleans. The validator layered on
//! top enforces the 8–15 band and the `#`-prefix rule on the cleaned set;
//! keeping those concerns apart means normalization stays idempotent and can
//! be applied to user-edited hashtag lists as well as model output.

/// Maximum hashtags kept after normalization.
pub const MAX_HASHTAGS: usize = 15;

/// Minimum hashtags the validator requires after normalization.
pub const MIN_HASHTAGS: usize = 8;

/// Normalize an arbitrary hashtag list.
///
/// Entries are trimmed and empties dropped. Duplicates are removed
/// case-insensitively while preserving first-occurrence order; the first
/// casing seen wins. The result is capped at `cap` entries.
pub fn normalize_hashtags(tags: &[String], cap: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<String> = Vec::new();

    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
        if out.len() == cap {
            break;
        }
    }

    out
}
