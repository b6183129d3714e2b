// ABOUTME: Document selection used to scope Q&A questions
// ABOUTME: Empty selection means every document is searched

use std::collections::BTreeSet;

/// Set of document ids chosen to restrict retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSelection {
    ids: BTreeSet<i64>,
}

impl DocumentSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, id: i64) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Drop ids that no longer exist on the server.
    pub fn retain_known(&mut self, known: impl IntoIterator<Item = i64>) {
        let known: BTreeSet<i64> = known.into_iter().collect();
        self.ids.retain(|id| known.contains(id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    /// Filter to send with a question; `None` when nothing is selected.
    pub fn as_filter(&self) -> Option<Vec<i64>> {
        if self.ids.is_empty() {
            None
        } else {
            Some(self.ids.iter().copied().collect())
        }
    }
}

impl FromIterator<i64> for DocumentSelection {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_membership() {
        let original: DocumentSelection = [1, 5].into_iter().collect();
        for id in [1, 2, 5, 99] {
            let mut selection = original.clone();
            selection.toggle(id);
            assert_ne!(selection, original);
            selection.toggle(id);
            assert_eq!(selection, original);
        }
    }

    #[test]
    fn test_toggle_reports_membership() {
        let mut selection = DocumentSelection::new();
        assert!(selection.toggle(3));
        assert!(selection.contains(3));
        assert!(!selection.toggle(3));
        assert!(!selection.contains(3));
    }

    #[test]
    fn test_empty_selection_has_no_filter() {
        let selection = DocumentSelection::new();
        assert_eq!(selection.as_filter(), None);
    }

    #[test]
    fn test_filter_is_sorted() {
        let selection: DocumentSelection = [9, 2, 4].into_iter().collect();
        assert_eq!(selection.as_filter(), Some(vec![2, 4, 9]));
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_retain_known() {
        let mut selection: DocumentSelection = [1, 42, 7].into_iter().collect();
        selection.retain_known([1, 7, 8]);
        assert_eq!(selection.ids().collect::<Vec<_>>(), vec![1, 7]);
    }
}
