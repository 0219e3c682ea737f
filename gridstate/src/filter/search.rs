//! Option search for filter dropdowns, using nucleo-matcher.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use super::{FilterItem, FilterSearch};

/// A fuzzy match against one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionMatch {
    /// Index of the label in the input list.
    pub index: usize,
    /// Match score (higher is better).
    pub score: u32,
}

/// Fuzzy-match `query` against `labels`.
///
/// Returns matches sorted by score, highest first. An empty query matches
/// every label with score 0.
pub fn fuzzy_matches(query: &str, labels: &[String]) -> Vec<OptionMatch> {
    if query.is_empty() {
        return (0..labels.len())
            .map(|index| OptionMatch { index, score: 0 })
            .collect();
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::new(query, CaseMatching::Ignore, Normalization::Smart, AtomKind::Fuzzy);

    let mut buf = Vec::new();
    let mut matches: Vec<OptionMatch> = labels
        .iter()
        .enumerate()
        .filter_map(|(index, label)| {
            let haystack = Utf32Str::new(label, &mut buf);
            pattern
                .score(haystack, &mut matcher)
                .map(|score| OptionMatch { index, score })
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

/// Options visible for a search query, in declared order.
///
/// A parent option stays when it matches or when any child does; its
/// children are narrowed the same way.
pub fn search_options(query: &str, items: &[FilterItem], search: &FilterSearch) -> Vec<FilterItem> {
    let query = query.trim();
    if query.is_empty() || !search.is_enabled() {
        return items.to_vec();
    }

    let labels: Vec<String> = items.iter().map(|item| item.text.clone()).collect();
    let fuzzy: Vec<usize> = match search {
        FilterSearch::Fuzzy => fuzzy_matches(query, &labels).into_iter().map(|m| m.index).collect(),
        _ => Vec::new(),
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let matched = match search {
                FilterSearch::Custom(f) => f(query, item),
                _ => fuzzy.contains(&index),
            };
            let children = search_options(query, &item.children, search);
            if matched {
                Some(item.clone())
            } else if !children.is_empty() {
                Some(item.clone().children(children))
            } else {
                None
            }
        })
        .collect()
}
