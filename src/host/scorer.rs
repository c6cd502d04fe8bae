use super::{HostResult, SpecificityScorer};

/// Bits reserved per scope depth; deeper matches always outrank shallower ones.
const DEPTH_SHIFT: usize = 4;
const MAX_SHIFT: usize = 56;

/// A small selector scorer for running without an editor.
///
/// Supports comma separated alternatives, descendant selectors and ` - `
/// exclusions. An atom matches a scope segment when it is equal to it or a
/// dot-prefix of it (`string` matches `string.quoted.double`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleScorer;

impl SpecificityScorer for SimpleScorer {
    fn score(&self, scope_path: &str, selector: &str) -> HostResult<u64> {
        let scopes: Vec<&str> = scope_path.split_whitespace().collect();
        Ok(selector
            .split(',')
            .map(|alternative| score_alternative(&scopes, alternative))
            .max()
            .unwrap_or(0))
    }
}

fn score_alternative(scopes: &[&str], alternative: &str) -> u64 {
    let mut parts = alternative.split(" - ");
    let include = parts.next().unwrap_or_default();
    if parts.any(|exclude| path_score(scopes, exclude) > 0) {
        return 0;
    }
    path_score(scopes, include)
}

fn path_score(scopes: &[&str], selector: &str) -> u64 {
    let atoms: Vec<&str> = selector.split_whitespace().collect();
    if atoms.is_empty() {
        return 0;
    }

    let mut limit = scopes.len();
    let mut score = 0u64;
    for atom in atoms.iter().rev() {
        let Some(depth) = scopes[..limit]
            .iter()
            .rposition(|scope| atom_matches(scope, atom))
        else {
            return 0;
        };
        let segments = atom.split('.').count() as u64;
        let weight = 1u64 << (DEPTH_SHIFT * (depth + 1)).min(MAX_SHIFT);
        score = score.saturating_add(segments.saturating_mul(weight));
        limit = depth;
    }
    score
}

fn atom_matches(scope: &str, atom: &str) -> bool {
    scope == atom
        || scope
            .strip_prefix(atom)
            .is_some_and(|rest| rest.starts_with('.'))
}
