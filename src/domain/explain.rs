//! Explainability helper: which criterion moved a score the most.

use crate::domain::scoring::{Contribution, ScoredRecord};

/// Contribution with the largest absolute weighted value.
///
/// Ties go to the earliest contribution in tradeoff-selection order.
pub fn most_influential(contributions: &[Contribution]) -> Option<&Contribution> {
    contributions.iter().fold(None, |best, c| match best {
        Some(b) if b.weighted_contribution.abs() >= c.weighted_contribution.abs() => Some(b),
        _ => Some(c),
    })
}

/// Highest-scoring record of a group; ties go to the earliest.
pub fn best_member<'a, I>(members: I) -> Option<&'a ScoredRecord>
where
    I: IntoIterator<Item = &'a ScoredRecord>,
{
    members.into_iter().fold(None, |best, r| match best {
        Some(b) if b.score >= r.score => Some(b),
        _ => Some(r),
    })
}

/// Most relevant factor of the group's best member, used to label decisions.
pub fn group_factor<'a, I>(members: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a ScoredRecord>,
{
    best_member(members)
        .and_then(|r| most_influential(&r.contributions))
        .map(|c| c.column.as_str())
}
