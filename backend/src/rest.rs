//! Thin REST surface over the domain services.
//!
//! Handlers stay free of business logic: they parse the request, call
//! into the domain layer and shape the JSON response.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use shared::{
    Beneficiary, EventRecord, RecordCard, RestoreResponse, RosterQuery, Session, TrashListResponse,
    Volunteer,
};
use tracing::info;

use crate::domain::card_list::{format_cards, CardSource};
use crate::domain::display_list::{
    derive_beneficiaries, derive_events, derive_volunteers, BeneficiaryFilter, EventFilter,
    EventSort, ProfileSort,
};
use crate::domain::records::load_active;
use crate::domain::session::require_authenticated;
use crate::domain::trash::RestoreOutcome;
use crate::domain::{CalendarService, TrashService};
use crate::storage::{BlobStore, Notifier, RecordStore, StoreError};

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub calendar: CalendarService,
    pub beneficiary_trash: TrashService<Beneficiary>,
    pub event_trash: TrashService<EventRecord>,
    /// Session of the acting user, injected explicitly (no ambient auth)
    pub session: Session,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        session: Session,
    ) -> Self {
        Self {
            calendar: CalendarService::new(Arc::clone(&store), Arc::clone(&notifier)),
            beneficiary_trash: TrashService::new(Arc::clone(&store), Arc::clone(&notifier)),
            event_trash: TrashService::new(Arc::clone(&store), Arc::clone(&notifier)),
            store,
            blobs,
            notifier,
            session,
        }
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/calendar/:year/:month", get(calendar_month))
        .route("/beneficiaries", get(list_beneficiaries))
        .route("/volunteers", get(list_volunteers))
        .route("/events", get(list_events))
        .route("/trash/beneficiaries", get(list_trashed_beneficiaries))
        .route("/trash/events", get(list_trashed_events))
        .route("/trash/:collection/:id/restore", post(restore_record))
        .route("/blobs/*path", get(get_blob))
        .with_state(state)
}

/// View options for the calendar grid
#[derive(Debug, Default, serde::Deserialize)]
struct CalendarViewQuery {
    /// Day whose week to show when minimized
    selected: Option<chrono::NaiveDate>,
    /// Collapse the grid to the selected week
    minimized: Option<bool>,
}

async fn calendar_month(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(i32, u32)>,
    Query(view): Query<CalendarViewQuery>,
) -> impl IntoResponse {
    if !(1..=12).contains(&month) {
        return (
            StatusCode::BAD_REQUEST,
            format!("Invalid month: {}. Must be between 1 and 12", month),
        )
            .into_response();
    }
    match state.calendar.load_month(month, year).await {
        Ok(mut grid) => {
            if let Some(selected) = view.selected {
                grid.weeks =
                    state
                        .calendar
                        .visible_weeks(&grid, selected, view.minimized.unwrap_or(false));
            }
            (StatusCode::OK, Json(grid)).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn list_beneficiaries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RosterQuery>,
) -> Json<Vec<RecordCard>> {
    let records =
        load_active::<Beneficiary>(state.store.as_ref(), state.notifier.as_ref()).await;
    let filter = query
        .filter
        .as_deref()
        .and_then(BeneficiaryFilter::parse)
        .unwrap_or_default();
    let sort = query.sort.as_deref().and_then(ProfileSort::parse);
    let now = Utc::now();
    let list = derive_beneficiaries(&records, filter, sort, query.search.as_deref(), now);
    Json(format_cards(&list, now))
}

async fn list_volunteers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RosterQuery>,
) -> Json<Vec<RecordCard>> {
    let records = load_active::<Volunteer>(state.store.as_ref(), state.notifier.as_ref()).await;
    let sort = query.sort.as_deref().and_then(ProfileSort::parse);
    let now = Utc::now();
    let list = derive_volunteers(&records, sort, query.search.as_deref(), now);
    Json(format_cards(&list, now))
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RosterQuery>,
) -> Json<Vec<RecordCard>> {
    let records = load_active::<EventRecord>(state.store.as_ref(), state.notifier.as_ref()).await;
    let filter = query
        .filter
        .as_deref()
        .and_then(EventFilter::parse)
        .unwrap_or_default();
    let sort = query.sort.as_deref().and_then(EventSort::parse);
    let now = Utc::now();
    let list = derive_events(&records, filter, sort, query.search.as_deref(), now);
    Json(format_cards(&list, now))
}

fn trash_cards<T>(trash: &TrashService<T>) -> TrashListResponse
where
    T: crate::domain::records::Document + CardSource + Clone + Send + 'static,
{
    let now = Utc::now();
    let records = trash.visible_records();
    TrashListResponse {
        cards: format_cards(&records, now),
    }
}

async fn list_trashed_beneficiaries(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.beneficiary_trash.load().await.is_err() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "trash load failed").into_response();
    }
    Json(trash_cards(&state.beneficiary_trash)).into_response()
}

async fn list_trashed_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.event_trash.load().await.is_err() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "trash load failed").into_response();
    }
    Json(trash_cards(&state.event_trash)).into_response()
}

/// Serve a profile picture out of the blob store.
async fn get_blob(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    match state.blobs.fetch_blob(&path).await {
        Ok(bytes) => (StatusCode::OK, bytes).into_response(),
        Err(StoreError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, format!("no blob at {}", path)).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn restore_record(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let user = match require_authenticated(&state.session) {
        Ok(user) => user,
        Err(e) => return (StatusCode::UNAUTHORIZED, e.to_string()).into_response(),
    };
    info!("♻️ {} requested restore of {}/{}", user.display_name, collection, id);

    let outcome = match collection.as_str() {
        "beneficiaries" => state
            .beneficiary_trash
            .restore(&id)
            .await
            .map(|o| o.map_record(|b| b.full_name())),
        "events" => state
            .event_trash
            .restore(&id)
            .await
            .map(|o| o.map_record(|e| e.name.clone())),
        _ => {
            return (StatusCode::NOT_FOUND, format!("unknown collection: {}", collection))
                .into_response()
        }
    };

    match outcome {
        Ok(RestoreOutcome::Restored(name)) => (
            StatusCode::OK,
            Json(RestoreResponse {
                restored: true,
                message: format!("{} restored.", name),
            }),
        )
            .into_response(),
        Ok(RestoreOutcome::Ignored) => (
            StatusCode::ACCEPTED,
            Json(RestoreResponse {
                restored: false,
                message: "A restore for this record is already pending.".to_string(),
            }),
        )
            .into_response(),
        Ok(RestoreOutcome::Failed) => (
            StatusCode::BAD_GATEWAY,
            Json(RestoreResponse {
                restored: false,
                message: "Restore failed; the record is back in the trash.".to_string(),
            }),
        )
            .into_response(),
        Ok(RestoreOutcome::NotFound) => {
            (StatusCode::NOT_FOUND, format!("no such record: {}", id)).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
