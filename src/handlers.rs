use crate::errors::{AppError, EmissionError};
use crate::models::{
    ChartResponse, EmissionEntry, EntryPage, EntryRequest, FieldErrors, ListQuery,
    PreferencesResponse, PreferencesUpdate, SummaryTotals,
};
use crate::preferences::Preferences;
use crate::session::{AddForm, EditSession};
use crate::state::AppState;
use crate::views::{chart, filtered_and_paged, summary_totals, table_page};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate};

pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<EntryPage>, AppError> {
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(AppError::bad_request("page must be at least 1"));
    }
    if query.page_size == Some(0) {
        return Err(AppError::bad_request("page_size must be at least 1"));
    }

    let repo = state.repo.lock().await;
    let prefs = repo.preferences();
    let page_size = query.page_size.unwrap_or(prefs.entries_per_page);
    let response = match query.scope {
        Some(scope) => filtered_and_paged(repo.list(), scope, page, page_size),
        None => {
            let prefs = Preferences {
                entries_per_page: page_size,
                ..prefs
            };
            table_page(repo.list(), &prefs, page)
        }
    };
    Ok(Json(response))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<EmissionEntry>, AppError> {
    let repo = state.repo.lock().await;
    let entry = repo.get(id).cloned().ok_or(EmissionError::NotFound(id))?;
    Ok(Json(entry))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<EmissionEntry>), AppError> {
    let mut form = AddForm::new();
    form.apply_request(request, today());
    reject_corrected_date(form.errors())?;

    let entry = state.write(move |repo| form.submit(repo)).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Fields missing from the request keep their current value.
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<EntryRequest>,
) -> Result<Json<EmissionEntry>, AppError> {
    let updated = state
        .write(move |repo| {
            let current = repo.get(id).cloned().ok_or(EmissionError::NotFound(id))?;
            let mut edit = EditSession::new();
            edit.begin(&current);
            edit.apply_request(request, today());
            reject_corrected_date(edit.errors())?;
            edit.submit(repo)
        })
        .await?;
    Ok(Json(updated))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    state.write(move |repo| repo.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_chart(State(state): State<AppState>) -> Json<ChartResponse> {
    let repo = state.repo.lock().await;
    Json(chart(repo.list(), &repo.preferences()))
}

pub async fn get_summary(State(state): State<AppState>) -> Json<SummaryTotals> {
    let repo = state.repo.lock().await;
    Json(summary_totals(repo.list()))
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    let repo = state.repo.lock().await;
    Json(repo.preferences())
}

/// Every preference feeds the table view, so a successful change returns it to page 1.
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let response = state
        .write(move |repo| {
            let notice = repo.update_preferences(update)?;
            Ok(PreferencesResponse {
                preferences: repo.preferences(),
                notice: notice.map(str::to_string),
                page: 1,
            })
        })
        .await?;
    Ok(Json(response))
}

pub async fn reset(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.write(|repo| repo.reset_all()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The form quietly swaps a future or unreadable date for today; an API caller never sees
/// that flag, so the request is refused instead.
fn reject_corrected_date(errors: FieldErrors) -> Result<(), EmissionError> {
    if errors.date {
        return Err(EmissionError::Validation(FieldErrors {
            date: true,
            ..FieldErrors::default()
        }));
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
