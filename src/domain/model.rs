use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One downloadable media entry from a feed.
///
/// Ordering and equality run over `title`, `file_extension` and `source_url`
/// in that order, so two entries only collapse when all three match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub file_extension: String,
    pub source_url: String,
}

impl Item {
    pub fn new(
        title: impl Into<String>,
        file_extension: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            file_extension: file_extension.into(),
            source_url: source_url.into(),
        }
    }

    /// `<title>.<ext>`, shared by the staging and final paths.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.title, self.file_extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Downloading,
    Committed,
    FailedThisPass,
}

/// Per-item "downloaded" flags for a single run.
///
/// Entries are created once, all `false`, and only ever flip to `true`.
#[derive(Debug, Clone, Default)]
pub struct CompletionMap {
    entries: BTreeMap<Item, bool>,
}

impl CompletionMap {
    pub fn new(items: &[Item]) -> Self {
        Self {
            entries: items.iter().cloned().map(|item| (item, false)).collect(),
        }
    }

    pub fn is_complete(&self, item: &Item) -> bool {
        self.entries.get(item).copied().unwrap_or(false)
    }

    /// Returns `true` if the item transitioned from incomplete to complete.
    pub fn mark_complete(&mut self, item: &Item) -> bool {
        match self.entries.get_mut(item) {
            Some(done) if !*done => {
                *done = true;
                true
            }
            _ => false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.entries.values().filter(|done| !**done).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Incomplete items, in the order of `items`.
    pub fn pending_items<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        items.iter().filter(|item| !self.is_complete(item)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { downloaded: usize, skipped: usize },
    Stalled { pending: Vec<Item> },
}

/// Summary of one orchestration run, printed with `--json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub total: usize,
    pub passes: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub pending: Vec<String>,
    pub staging_removed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<Item> {
        vec![
            Item::new("ep2", "mp3", "http://x/2"),
            Item::new("ep1", "mp3", "http://x/1"),
        ]
    }

    #[test]
    fn test_file_name() {
        assert_eq!(Item::new("ep1", "m4a", "http://x/1").file_name(), "ep1.m4a");
    }

    #[test]
    fn test_completion_map_starts_incomplete() {
        let items = items();
        let map = CompletionMap::new(&items);
        assert_eq!(map.len(), 2);
        assert_eq!(map.remaining(), 2);
        assert!(!map.is_complete(&items[0]));
    }

    #[test]
    fn test_mark_complete_only_transitions_once() {
        let items = items();
        let mut map = CompletionMap::new(&items);

        assert!(map.mark_complete(&items[1]));
        assert!(!map.mark_complete(&items[1]));
        assert_eq!(map.remaining(), 1);

        let stranger = Item::new("ep9", "mp3", "http://x/9");
        assert!(!map.mark_complete(&stranger));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_pending_items_keep_feed_order() {
        let items = items();
        let mut map = CompletionMap::new(&items);
        let pending: Vec<&str> = map
            .pending_items(&items)
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(pending, ["ep2", "ep1"]);

        map.mark_complete(&items[0]);
        let pending = map.pending_items(&items);
        assert_eq!(pending, [&items[1]]);
    }

    #[test]
    fn test_identical_items_share_one_entry() {
        let item = Item::new("ep1", "mp3", "http://x/1");
        let map = CompletionMap::new(&[item.clone(), item]);
        assert_eq!(map.len(), 1);
    }
}
