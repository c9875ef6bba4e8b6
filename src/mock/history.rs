use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::contracts::HistoryDeleteOption;

/// Append-only request history of a mock service.
///
/// Entries keep insertion order and are never deduplicated.
pub struct HistoryStore<E> {
    entries: RwLock<Vec<E>>,
}

impl<E> Default for HistoryStore<E> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<E: Clone> HistoryStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: E) {
        self.write().push(entry);
    }

    /// Returns the entries accepted by `filter`, then applies `delete`.
    pub fn query<F>(&self, filter: F, delete: HistoryDeleteOption) -> Vec<E>
    where
        F: Fn(&E) -> bool,
    {
        let mut entries = self.write();
        let matched: Vec<E> = entries.iter().filter(|e| filter(e)).cloned().collect();

        match delete {
            HistoryDeleteOption::DeleteNothing => {}
            HistoryDeleteOption::DeleteQueriedHistory => entries.retain(|e| !filter(e)),
            HistoryDeleteOption::DeleteFullHistory => entries.clear(),
        }

        matched
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<E>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<E>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
