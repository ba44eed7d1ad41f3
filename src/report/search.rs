//! Text search over a list of budget items, for stepping through hits one at a time.

use crate::model::BudgetItem;
use serde::{Deserialize, Serialize};

/// The items matching a search, and which of them comes next.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchResult {
    pub matches: Vec<BudgetItem>,
    /// Index into `matches` of the first hit after the selected item, wrapping around to the
    /// first hit. `None` when nothing matched.
    pub next: Option<usize>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The hit to move to.
    pub fn next_item(&self) -> Option<&BudgetItem> {
        self.next.and_then(|i| self.matches.get(i))
    }
}

/// Finds the items whose short description or plain amount (e.g. `-10.5`) contains `needle`.
/// Matching is case-sensitive.
///
/// `selected` is the position in `items` the user is currently on, if any. An empty needle
/// matches nothing.
pub fn search(items: &[BudgetItem], needle: &str, selected: Option<usize>) -> SearchResult {
    if needle.is_empty() {
        return SearchResult::default();
    }

    let mut matches = Vec::new();
    let mut next = 0;
    for (position, item) in items.iter().enumerate() {
        if item.short_description.contains(needle) || item.amount.plain().contains(needle) {
            matches.push(item.clone());
        }
        if selected == Some(position) {
            next = matches.len();
        }
    }

    if matches.is_empty() {
        return SearchResult::default();
    }
    if next >= matches.len() {
        next = 0;
    }
    SearchResult {
        matches,
        next: Some(next),
    }
}
