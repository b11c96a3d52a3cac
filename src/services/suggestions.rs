//! Alternate username suggestions for a name that is already taken.
//!
//! Candidates are probed one at a time, in a fixed order, and probing stops
//! as soon as enough free names are found. Clients display the suggestions
//! in the order returned, so the order is part of the contract.

use std::future::Future;

/// Upper bound on the number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 3;

/// Number of candidate patterns generated per name.
pub const CANDIDATE_COUNT: usize = 6;

/// Builds the candidate patterns for a first/last name pair, in probe order.
#[must_use]
pub fn candidate_usernames(first_name: &str, last_name: &str) -> [String; CANDIDATE_COUNT] {
    [
        format!("{first_name}.{last_name}"),
        format!("{first_name}_{last_name}"),
        format!("{first_name}{last_name}"),
        format!("{first_name}.{last_name}123"),
        format!("{first_name}_{last_name}123"),
        format!("{first_name}{last_name}123"),
    ]
}

/// Probes each candidate with `exists` and collects up to
/// [`MAX_SUGGESTIONS`] that are free.
///
/// The first probe error aborts the whole operation; no partial list is
/// returned.
pub async fn suggest_usernames<F, Fut, E>(
    first_name: &str,
    last_name: &str,
    mut exists: F,
) -> Result<Vec<String>, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let mut suggestions = Vec::with_capacity(MAX_SUGGESTIONS);

    for candidate in candidate_usernames(first_name, last_name) {
        if !exists(candidate.clone()).await? {
            suggestions.push(candidate);
        }

        if suggestions.len() >= MAX_SUGGESTIONS {
            break;
        }
    }

    Ok(suggestions)
}
