use crate::demo;
use crate::errors::EmissionError;
use crate::models::{EmissionEntry, EntryDraft, PreferencesUpdate, ScopeFilter};
use crate::preferences::Preferences;
use crate::storage::{ALL_KEYS, BAR_SCOPE_KEY, EMISSIONS_KEY, KeyValueStore, StoreError};
use chrono::{DateTime, Local, NaiveDate};
use tracing::{error, info, warn};

/// Owns the entry collection and preferences; every mutation is written through to the store.
///
/// Entries and each preference live under separate keys, so a failed write can leave them out
/// of step with each other. The in-memory state is always the authoritative copy.
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
    entries: Vec<EmissionEntry>,
    preferences: Preferences,
    last_id: u64,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn open(mut store: S) -> Result<Self, EmissionError> {
        let entries = load_entries(&store)?.unwrap_or_default();
        let preferences = Preferences::load(&store)?;
        if preferences.is_stacked {
            store_forced_bar_scope(&mut store, preferences.bar_scope)?;
        }
        let last_id = entries.iter().map(|entry| entry.id).max().unwrap_or(0);
        Ok(Self {
            store,
            entries,
            preferences,
            last_id,
        })
    }

    /// Like [`Repository::open`], seeding `demo_entries` generated entries into a store that
    /// has never held any.
    pub fn open_with_demo(store: S, demo_entries: usize) -> Result<Self, EmissionError> {
        let mut repo = Self::open(store)?;
        if demo_entries > 0 && repo.store.get(EMISSIONS_KEY)?.is_none() {
            repo.entries = demo::generate(demo_entries);
            repo.last_id = repo.entries.iter().map(|entry| entry.id).max().unwrap_or(0);
            repo.persist_entries()?;
            info!(count = repo.entries.len(), "seeded demo entries");
        }
        Ok(repo)
    }

    /// Newest-created first.
    pub fn list(&self) -> &[EmissionEntry] {
        &self.entries
    }

    pub fn get(&self, id: u64) -> Option<&EmissionEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn create(&mut self, draft: EntryDraft) -> Result<EmissionEntry, EmissionError> {
        self.create_at(draft, Local::now())
    }

    pub fn create_at(
        &mut self,
        draft: EntryDraft,
        now: DateTime<Local>,
    ) -> Result<EmissionEntry, EmissionError> {
        let entry = build_entry(0, draft, now.date_naive())?;
        let entry = EmissionEntry {
            id: self.next_id(now.timestamp_millis()),
            ..entry
        };
        self.entries.insert(0, entry.clone());
        info!(id = entry.id, scope = %entry.scope, emission = entry.emission, "entry added");
        self.persist_entries()?;
        Ok(entry)
    }

    pub fn update(&mut self, id: u64, draft: EntryDraft) -> Result<EmissionEntry, EmissionError> {
        self.update_at(id, draft, Local::now().date_naive())
    }

    /// Replaces every field except `id`, keeping the entry's position.
    pub fn update_at(
        &mut self,
        id: u64,
        draft: EntryDraft,
        today: NaiveDate,
    ) -> Result<EmissionEntry, EmissionError> {
        let position = self.position(id)?;
        let entry = build_entry(id, draft, today)?;
        self.entries[position] = entry.clone();
        info!(id, "entry updated");
        self.persist_entries()?;
        Ok(entry)
    }

    pub fn delete(&mut self, id: u64) -> Result<EmissionEntry, EmissionError> {
        let position = self.position(id)?;
        let removed = self.entries.remove(position);
        info!(id, "entry deleted");
        self.persist_entries()?;
        Ok(removed)
    }

    /// Empties the collection, restores default preferences and removes every stored key.
    pub fn reset_all(&mut self) -> Result<(), EmissionError> {
        self.entries.clear();
        self.preferences = Preferences::default();

        let mut first_error = None;
        for key in ALL_KEYS {
            if let Err(err) = self.store.remove(key) {
                warn!(key, "failed to remove key: {err}");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        info!("all data reset");
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Applies the given preference changes and stores every key whose value changed.
    /// Returns a notice when the stacking rule overrode the chart scope.
    pub fn update_preferences(
        &mut self,
        update: PreferencesUpdate,
    ) -> Result<Option<&'static str>, EmissionError> {
        let mut next = self.preferences;
        if let Some(page_size) = update.entries_per_page {
            next.set_entries_per_page(page_size)?;
        }

        let mut notice = None;
        if let Some(stacked) = update.is_stacked {
            notice = next.set_stacked(stacked).or(notice);
        }
        if let Some(scope) = update.bar_scope {
            notice = next.set_bar_scope(scope).or(notice);
        }
        if let Some(scope) = update.table_filter_scope {
            next.table_filter_scope = scope;
        }

        let previous = std::mem::replace(&mut self.preferences, next);
        let mut first_error = None;
        for ((key, value), (_, old)) in next.encoded().into_iter().zip(previous.encoded()) {
            if value == old {
                continue;
            }
            if let Err(err) = self.store.set(key, value) {
                warn!(key, "failed to persist preference: {err}");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        if let Some(notice) = notice {
            info!("{notice}");
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(notice),
        }
    }

    fn position(&self, id: u64) -> Result<usize, EmissionError> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(EmissionError::NotFound(id))
    }

    fn next_id(&mut self, now_millis: i64) -> u64 {
        let candidate = u64::try_from(now_millis).unwrap_or(0);
        let id = candidate.max(self.last_id.saturating_add(1));
        self.last_id = id;
        id
    }

    fn persist_entries(&mut self) -> Result<(), EmissionError> {
        let result = serde_json::to_string(&self.entries)
            .map_err(StoreError::from)
            .and_then(|payload| self.store.set(EMISSIONS_KEY, payload));
        if let Err(err) = result {
            warn!("failed to persist entries: {err}");
            return Err(err.into());
        }
        Ok(())
    }
}

fn build_entry(id: u64, draft: EntryDraft, today: NaiveDate) -> Result<EmissionEntry, EmissionError> {
    let errors = draft.validate_at(today);
    match (errors.any(), draft.emission, draft.date) {
        (false, Some(emission), Some(date)) => Ok(EmissionEntry {
            id,
            description: draft.description,
            scope: draft.scope,
            emission,
            date,
        }),
        _ => Err(EmissionError::Validation(errors)),
    }
}

/// A stacked chart always shows every scope; a stale single-scope `barScope` is overwritten.
/// A failed write is logged and left for the next preference change.
fn store_forced_bar_scope<S: KeyValueStore>(
    store: &mut S,
    bar_scope: ScopeFilter,
) -> Result<(), StoreError> {
    let forced = bar_scope.to_string();
    let Some(stored) = store.get(BAR_SCOPE_KEY)? else {
        return Ok(());
    };
    if stored.trim() != forced {
        if let Err(err) = store.set(BAR_SCOPE_KEY, forced) {
            warn!("failed to store chart scope: {err}");
        }
    }
    Ok(())
}

fn load_entries<S: KeyValueStore>(store: &S) -> Result<Option<Vec<EmissionEntry>>, StoreError> {
    let Some(raw) = store.get(EMISSIONS_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(entries) => Ok(Some(entries)),
        Err(err) => {
            error!("failed to parse stored entries: {err}");
            Ok(Some(Vec::new()))
        }
    }
}
