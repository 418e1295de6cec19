use crate::errors::EmissionError;
use crate::models::ScopeFilter;
use crate::storage::{
    BAR_SCOPE_KEY, ENTRIES_PER_PAGE_KEY, IS_STACKED_KEY, KeyValueStore, StoreError,
    TABLE_FILTER_SCOPE_KEY,
};
use serde::Serialize;
use std::str::FromStr;
use tracing::warn;

pub const PAGE_SIZE_OPTIONS: [usize; 4] = [20, 50, 100, 200];
pub const DEFAULT_PAGE_SIZE: usize = 50;

pub const STACKED_SCOPE_NOTICE: &str =
    "Stacked view is not supported for individual scopes. Switching to All Scopes.";

/// Chart and table settings restored at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub bar_scope: ScopeFilter,
    pub is_stacked: bool,
    pub table_filter_scope: ScopeFilter,
    pub entries_per_page: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            bar_scope: ScopeFilter::All,
            is_stacked: false,
            table_filter_scope: ScopeFilter::All,
            entries_per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Preferences {
    /// Reads each key independently; absent or unreadable values fall back to defaults.
    pub fn load<S: KeyValueStore>(store: &S) -> Result<Self, StoreError> {
        let defaults = Self::default();
        let mut prefs = Self {
            bar_scope: read_key(store, BAR_SCOPE_KEY, defaults.bar_scope)?,
            is_stacked: read_key(store, IS_STACKED_KEY, defaults.is_stacked)?,
            table_filter_scope: read_key(store, TABLE_FILTER_SCOPE_KEY, defaults.table_filter_scope)?,
            entries_per_page: read_key(store, ENTRIES_PER_PAGE_KEY, defaults.entries_per_page)?,
        };

        if !PAGE_SIZE_OPTIONS.contains(&prefs.entries_per_page) {
            warn!(value = prefs.entries_per_page, "ignoring stored page size");
            prefs.entries_per_page = DEFAULT_PAGE_SIZE;
        }
        if prefs.is_stacked && prefs.bar_scope != ScopeFilter::All {
            prefs.bar_scope = ScopeFilter::All;
        }
        Ok(prefs)
    }

    /// A single-scope chart cannot be stacked; such a request resets the chart to all scopes.
    pub fn set_bar_scope(&mut self, scope: ScopeFilter) -> Option<&'static str> {
        if self.is_stacked && scope != ScopeFilter::All {
            self.bar_scope = ScopeFilter::All;
            return Some(STACKED_SCOPE_NOTICE);
        }
        self.bar_scope = scope;
        None
    }

    pub fn set_stacked(&mut self, stacked: bool) -> Option<&'static str> {
        self.is_stacked = stacked;
        if stacked && self.bar_scope != ScopeFilter::All {
            self.bar_scope = ScopeFilter::All;
            return Some(STACKED_SCOPE_NOTICE);
        }
        None
    }

    pub fn set_entries_per_page(&mut self, page_size: usize) -> Result<(), EmissionError> {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return Err(EmissionError::InvalidPreference(format!(
                "entries_per_page must be one of {PAGE_SIZE_OPTIONS:?}"
            )));
        }
        self.entries_per_page = page_size;
        Ok(())
    }

    /// Stored text for every preference key.
    pub fn encoded(&self) -> [(&'static str, String); 4] {
        [
            (BAR_SCOPE_KEY, self.bar_scope.to_string()),
            (IS_STACKED_KEY, self.is_stacked.to_string()),
            (TABLE_FILTER_SCOPE_KEY, self.table_filter_scope.to_string()),
            (ENTRIES_PER_PAGE_KEY, self.entries_per_page.to_string()),
        ]
    }
}

fn read_key<S, T>(store: &S, key: &str, default: T) -> Result<T, StoreError>
where
    S: KeyValueStore,
    T: FromStr,
{
    let Some(raw) = store.get(key)? else {
        return Ok(default);
    };
    match raw.trim().parse() {
        Ok(value) => Ok(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unreadable preference");
            Ok(default)
        }
    }
}
