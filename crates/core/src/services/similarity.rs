use crate::model::split_extension;
use crate::services::edit_distance::{weighted_edit_distance, EditCosts};

/// Costs for comparing file names. A substitution costs as much as a
/// deletion plus an insertion.
pub const NAME_EDIT_COSTS: EditCosts = EditCosts::new(1, 1, 2);

/// Closeness of a current file name to its canonical name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScore {
    /// 0 (unrelated) to 100 (identical).
    pub similarity: f64,
    pub extension_matches: bool,
}

fn chars_match(a: char, b: char, ignore_case: bool) -> bool {
    if ignore_case {
        a == b || a.to_lowercase().eq(b.to_lowercase())
    } else {
        a == b
    }
}

/// Score `current` against `canonical`.
///
/// Extension comparison is always case-insensitive; character comparison in
/// the edit distance follows `ignore_case`.
pub fn score(current: &str, canonical: &str, ignore_case: bool) -> SimilarityScore {
    let (_, current_ext) = split_extension(current);
    let (_, canonical_ext) = split_extension(canonical);
    let extension_matches = current_ext.to_lowercase() == canonical_ext.to_lowercase();

    let current_chars: Vec<char> = current.chars().collect();
    let canonical_chars: Vec<char> = canonical.chars().collect();
    let total = (current_chars.len() + canonical_chars.len()) as f64;
    if total == 0.0 {
        return SimilarityScore { similarity: 100.0, extension_matches };
    }

    let distance = weighted_edit_distance(&current_chars, &canonical_chars, NAME_EDIT_COSTS, |a, b| {
        chars_match(a, b, ignore_case)
    }) as f64;
    let similarity = (100.0 * (total - distance) / total).clamp(0.0, 100.0);

    SimilarityScore { similarity, extension_matches }
}
