//! Binding free-text model answers onto declared option labels.
//!
//! The policy is deliberately simple: exact equality first, then substring
//! containment in either direction, ties broken by option order. No scored
//! similarity matching.

/// Match one free-text answer against the option labels.
///
/// Returns the matched label, or the answer unchanged when nothing matched,
/// so the result is only guaranteed to be one of the labels when a match
/// actually occurred.
pub fn match_one(answer: &str, labels: &[String]) -> String {
    if labels.is_empty() {
        return answer.to_string();
    }

    let needle = answer.trim().to_lowercase();
    if let Some(exact) = labels.iter().find(|l| l.trim().to_lowercase() == needle) {
        return exact.clone();
    }

    let loose = answer.to_lowercase();
    if let Some(partial) = labels.iter().find(|l| {
        let label = l.to_lowercase();
        label.contains(&loose) || loose.contains(&label)
    }) {
        return partial.clone();
    }

    answer.to_string()
}

/// Match a comma-separated multi-choice answer.
///
/// Parts are trimmed and matched individually; empty parts are dropped.
/// Order is preserved and duplicates are kept.
pub fn match_multi(answer: &str, labels: &[String]) -> Vec<String> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match_one(part, labels))
        .collect()
}
