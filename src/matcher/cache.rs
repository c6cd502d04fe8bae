use rustc_hash::FxHashMap;

use super::ResolvedStyle;

/// Memoizes the unrendered style per scope path.
///
/// Lives exactly as long as the scheme it was built from; reloading a scheme
/// builds a new matcher and with it an empty cache.
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: FxHashMap<String, ResolvedStyle>,
}

impl MatchCache {
    pub fn get(&self, scope_path: &str) -> Option<&ResolvedStyle> {
        self.entries.get(scope_path)
    }

    pub fn insert(&mut self, scope_path: &str, style: ResolvedStyle) {
        self.entries.insert(scope_path.to_string(), style);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
