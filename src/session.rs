//! Draft state for the add form and the edit popover.
//!
//! Both sessions hold raw user input (the emission is kept as typed text) and carry
//! per-field error flags. A failed submit leaves the session `Invalid`; touching a field
//! clears that field's flag and moves the session back to `Editing`.

use crate::errors::EmissionError;
use crate::models::{EmissionEntry, EntryDraft, EntryRequest, FieldErrors, Scope, parse_date, parse_emission};
use crate::repository::Repository;
use crate::storage::KeyValueStore;
use chrono::{DateTime, Local, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Empty,
    Editing,
    Valid,
    Invalid,
}

/// Field values as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    pub description: String,
    pub scope: Scope,
    pub emission: String,
    pub date: Option<NaiveDate>,
}

impl Default for FormDraft {
    fn default() -> Self {
        Self {
            description: String::new(),
            scope: Scope::Scope1,
            emission: String::new(),
            date: None,
        }
    }
}

impl FormDraft {
    fn from_entry(entry: &EmissionEntry) -> Self {
        Self {
            description: entry.description.clone(),
            scope: entry.scope,
            emission: entry.emission.to_string(),
            date: Some(entry.date),
        }
    }

    pub fn to_entry_draft(&self) -> EntryDraft {
        EntryDraft {
            description: self.description.clone(),
            scope: self.scope,
            emission: parse_emission(&self.emission),
            date: self.date,
        }
    }
}

/// Shared field editing for both sessions.
#[derive(Debug, Clone)]
struct Fields {
    draft: FormDraft,
    errors: FieldErrors,
    status: SessionStatus,
}

impl Fields {
    fn new(draft: FormDraft, status: SessionStatus) -> Self {
        Self {
            draft,
            errors: FieldErrors::default(),
            status,
        }
    }

    fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
        self.errors.description = false;
        self.status = SessionStatus::Editing;
    }

    fn set_scope(&mut self, scope: Scope) {
        self.draft.scope = scope;
        self.status = SessionStatus::Editing;
    }

    fn set_emission(&mut self, emission: impl Into<String>) {
        self.draft.emission = emission.into();
        self.errors.emission = false;
        self.status = SessionStatus::Editing;
    }

    /// A date after `today` is replaced by `today` and flagged.
    fn set_date_at(&mut self, date: Option<NaiveDate>, today: NaiveDate) {
        match date {
            Some(date) if date <= today => {
                self.draft.date = Some(date);
                self.errors.date = false;
            }
            _ => {
                self.draft.date = Some(today);
                self.errors.date = true;
            }
        }
        self.status = SessionStatus::Editing;
    }

    fn apply_request(&mut self, request: EntryRequest, today: NaiveDate) {
        if let Some(description) = request.description {
            self.set_description(description);
        }
        if let Some(scope) = request.scope {
            self.set_scope(scope);
        }
        if let Some(emission) = request.emission {
            self.set_emission(emission.into_text());
        }
        if let Some(date) = request.date {
            self.set_date_at(parse_date(&date), today);
        }
    }

    /// Re-evaluates all flags together.
    fn validate_at(&mut self, today: NaiveDate) -> Result<EntryDraft, EmissionError> {
        let draft = self.draft.to_entry_draft();
        self.errors = draft.validate_at(today);
        if self.errors.any() {
            self.status = SessionStatus::Invalid;
            return Err(EmissionError::Validation(self.errors));
        }
        self.status = SessionStatus::Valid;
        Ok(draft)
    }
}

/// The always-present "add entry" form.
#[derive(Debug, Clone)]
pub struct AddForm {
    fields: Fields,
}

impl Default for AddForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AddForm {
    pub fn new() -> Self {
        Self {
            fields: Fields::new(FormDraft::default(), SessionStatus::Empty),
        }
    }

    pub fn draft(&self) -> &FormDraft {
        &self.fields.draft
    }

    pub fn errors(&self) -> FieldErrors {
        self.fields.errors
    }

    pub fn status(&self) -> SessionStatus {
        self.fields.status
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.fields.set_description(description);
    }

    pub fn set_scope(&mut self, scope: Scope) {
        self.fields.set_scope(scope);
    }

    pub fn set_emission(&mut self, emission: impl Into<String>) {
        self.fields.set_emission(emission);
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.set_date_at(date, Local::now().date_naive());
    }

    pub fn set_date_at(&mut self, date: Option<NaiveDate>, today: NaiveDate) {
        self.fields.set_date_at(date, today);
    }

    pub fn apply_request(&mut self, request: EntryRequest, today: NaiveDate) {
        self.fields.apply_request(request, today);
    }

    pub fn submit<S: KeyValueStore>(
        &mut self,
        repo: &mut Repository<S>,
    ) -> Result<EmissionEntry, EmissionError> {
        let draft = self.fields.validate_at(Local::now().date_naive())?;
        let result = repo.create(draft);
        self.finish(result)
    }

    /// Submit against a fixed clock.
    pub fn submit_at<S: KeyValueStore>(
        &mut self,
        repo: &mut Repository<S>,
        now: DateTime<Local>,
    ) -> Result<EmissionEntry, EmissionError> {
        let draft = self.fields.validate_at(now.date_naive())?;
        let result = repo.create_at(draft, now);
        self.finish(result)
    }

    fn finish(
        &mut self,
        result: Result<EmissionEntry, EmissionError>,
    ) -> Result<EmissionEntry, EmissionError> {
        // The repository keeps the entry in memory even if saving it failed.
        if matches!(result, Ok(_) | Err(EmissionError::Persistence(_))) {
            self.reset();
        }
        result
    }

    pub fn reset(&mut self) {
        self.fields = Fields::new(FormDraft::default(), SessionStatus::Empty);
    }
}

#[derive(Debug, Clone)]
struct OpenEdit {
    original: EmissionEntry,
    fields: Fields,
}

/// The edit popover. `Empty` while no entry is being edited.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    open: Option<OpenEdit>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the popover on a snapshot of `entry`, discarding any draft in progress.
    pub fn begin(&mut self, entry: &EmissionEntry) {
        self.open = Some(OpenEdit {
            original: entry.clone(),
            fields: Fields::new(FormDraft::from_entry(entry), SessionStatus::Editing),
        });
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn entry_id(&self) -> Option<u64> {
        self.open.as_ref().map(|edit| edit.original.id)
    }

    pub fn status(&self) -> SessionStatus {
        self.open
            .as_ref()
            .map_or(SessionStatus::Empty, |edit| edit.fields.status)
    }

    pub fn draft(&self) -> Option<&FormDraft> {
        self.open.as_ref().map(|edit| &edit.fields.draft)
    }

    pub fn errors(&self) -> FieldErrors {
        self.open
            .as_ref()
            .map_or_else(FieldErrors::default, |edit| edit.fields.errors)
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        if let Some(edit) = self.open.as_mut() {
            edit.fields.set_description(description);
        }
    }

    pub fn set_scope(&mut self, scope: Scope) {
        if let Some(edit) = self.open.as_mut() {
            edit.fields.set_scope(scope);
        }
    }

    pub fn set_emission(&mut self, emission: impl Into<String>) {
        if let Some(edit) = self.open.as_mut() {
            edit.fields.set_emission(emission);
        }
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.set_date_at(date, Local::now().date_naive());
    }

    pub fn set_date_at(&mut self, date: Option<NaiveDate>, today: NaiveDate) {
        if let Some(edit) = self.open.as_mut() {
            edit.fields.set_date_at(date, today);
        }
    }

    pub fn apply_request(&mut self, request: EntryRequest, today: NaiveDate) {
        if let Some(edit) = self.open.as_mut() {
            edit.fields.apply_request(request, today);
        }
    }

    /// Whether any field differs from the snapshot taken by [`EditSession::begin`].
    /// Submitting is only possible when this is true.
    pub fn has_changes(&self) -> bool {
        let Some(edit) = self.open.as_ref() else {
            return false;
        };
        let draft = &edit.fields.draft;
        let original = &edit.original;
        draft.description != original.description
            || draft.scope != original.scope
            || parse_emission(&draft.emission) != Some(original.emission)
            || draft.date != Some(original.date)
    }

    pub fn submit<S: KeyValueStore>(
        &mut self,
        repo: &mut Repository<S>,
    ) -> Result<EmissionEntry, EmissionError> {
        self.submit_at(repo, Local::now().date_naive())
    }

    pub fn submit_at<S: KeyValueStore>(
        &mut self,
        repo: &mut Repository<S>,
        today: NaiveDate,
    ) -> Result<EmissionEntry, EmissionError> {
        if !self.has_changes() {
            return Err(EmissionError::Unchanged);
        }
        let Some(edit) = self.open.as_mut() else {
            return Err(EmissionError::Unchanged);
        };
        let draft = edit.fields.validate_at(today)?;
        let result = repo.update_at(edit.original.id, draft, today);
        if matches!(result, Ok(_) | Err(EmissionError::Persistence(_) | EmissionError::NotFound(_))) {
            self.open = None;
        }
        result
    }

    /// Drops the draft without touching the repository.
    pub fn cancel(&mut self) {
        self.open = None;
    }
}
