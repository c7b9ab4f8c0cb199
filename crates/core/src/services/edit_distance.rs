/// Per-operation costs for [`weighted_edit_distance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditCosts {
    pub insertion: u32,
    pub deletion: u32,
    pub substitution: u32,
}

impl EditCosts {
    pub const fn new(insertion: u32, deletion: u32, substitution: u32) -> Self {
        Self { insertion, deletion, substitution }
    }
}

/// Weighted Levenshtein distance turning `source` into `target`.
///
/// `eq` decides whether two characters match (and therefore cost nothing).
/// Runs in O(n·m) time with a single row of O(m) space.
pub fn weighted_edit_distance<F>(source: &[char], target: &[char], costs: EditCosts, eq: F) -> u32
where
    F: Fn(char, char) -> bool,
{
    let mut row: Vec<u32> = (0..=target.len() as u32).map(|j| j * costs.insertion).collect();

    for (i, &s) in source.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = (i as u32 + 1) * costs.deletion;
        for (j, &t) in target.iter().enumerate() {
            let substitute = if eq(s, t) { diagonal } else { diagonal + costs.substitution };
            let delete = row[j + 1] + costs.deletion;
            let insert = row[j] + costs.insertion;
            diagonal = row[j + 1];
            row[j + 1] = substitute.min(delete).min(insert);
        }
    }

    row[target.len()]
}
