use std::cmp::Ordering;

use crate::model::RenamingCandidate;
use crate::services::walker::CandidateSet;

/// Ordering used to apply candidates: matching extensions first, then higher
/// similarity, then directory and current name ascending.
pub fn compare(a: &RenamingCandidate, b: &RenamingCandidate) -> Ordering {
    b.extension_matches
        .cmp(&a.extension_matches)
        .then_with(|| b.similarity.total_cmp(&a.similarity))
        .then_with(|| a.directory.as_os_str().cmp(b.directory.as_os_str()))
        .then_with(|| a.current_name.cmp(&b.current_name))
}

/// Consume a candidate set into a deterministic sequence.
pub fn rank(candidates: CandidateSet) -> Vec<RenamingCandidate> {
    let mut ordered: Vec<RenamingCandidate> = candidates.into_iter().collect();
    ordered.sort_by(compare);
    ordered
}
