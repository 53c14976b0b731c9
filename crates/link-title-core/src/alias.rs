use crate::similarity::similarity;

/// Decide whether `candidate` is an intentional use of one of `aliases`.
///
/// Comparison is case-insensitive. Rules, first hit wins:
/// 1. exact match
/// 2. substring match in either direction, in alias order
/// 3. best fuzzy score, if it reaches `threshold` (first maximum kept on ties)
///
/// Returns the alias as written in front matter.
pub fn resolve_alias<S: AsRef<str>>(candidate: &str, aliases: &[S], threshold: f64) -> Option<String> {
    let candidate_lower = candidate.to_lowercase();
    let lowered: Vec<(String, &str)> = aliases
        .iter()
        .map(|a| a.as_ref())
        .filter(|a| !a.is_empty())
        .map(|a| (a.to_lowercase(), a))
        .collect();

    if let Some((_, alias)) = lowered.iter().find(|(lower, _)| *lower == candidate_lower) {
        return Some(alias.to_string());
    }

    // First qualifying alias in sequence order wins, not the tightest fit.
    if let Some((_, alias)) = lowered
        .iter()
        .find(|(lower, _)| lower.contains(&candidate_lower) || candidate_lower.contains(lower.as_str()))
    {
        return Some(alias.to_string());
    }

    let mut best: Option<(f64, &str)> = None;
    for (lower, alias) in &lowered {
        let score = similarity(&candidate_lower, lower);
        match best {
            Some((best_score, _)) if score <= best_score => {}
            _ => best = Some((score, *alias)),
        }
    }

    best.filter(|(score, _)| *score >= threshold)
        .map(|(_, alias)| alias.to_string())
}
