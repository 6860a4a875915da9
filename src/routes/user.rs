use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Local;
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::trip::{TripDraft, TripPatch, TripRecord, DATE_FORMAT},
    services::view::Dashboard,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/trips", get(trips_list).post(trip_add))
        .route("/trips/:id/edit", get(trip_edit_form).post(trip_edit_submit))
        .route("/trips/:id/delete", post(trip_delete))
        .route("/dashboard", get(dashboard))
}

#[derive(Template)]
#[template(path = "user/home.html")]
struct HomeTemplate {
    email: String,
    added: bool,
    show_error: bool,
    error_message: String,
    form: TripFormValues,
}

/// What the trip forms show in their inputs.
#[derive(Clone, Default)]
struct TripFormValues {
    destination: String,
    start_date: String,
    end_date: String,
    budget: String,
    notes: String,
}

impl From<&TripDraft> for TripFormValues {
    fn from(draft: &TripDraft) -> Self {
        Self {
            destination: draft.destination.clone(),
            start_date: draft.start_date.clone(),
            end_date: draft.end_date.clone(),
            budget: draft.budget.clone(),
            notes: draft.notes.clone(),
        }
    }
}

impl From<&TripRecord> for TripFormValues {
    fn from(trip: &TripRecord) -> Self {
        Self {
            destination: trip.destination.clone(),
            start_date: trip.start_date.format(DATE_FORMAT).to_string(),
            end_date: trip.end_date.format(DATE_FORMAT).to_string(),
            budget: format_budget(trip.budget),
            notes: trip.notes.clone(),
        }
    }
}

impl TripFormValues {
    /// Submitted patch fields over what is currently stored.
    fn overlay(mut self, patch: TripPatch) -> Self {
        if let Some(destination) = patch.destination {
            self.destination = destination;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(budget) = patch.budget {
            self.budget = budget;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self
    }
}

#[derive(Deserialize)]
struct HomeQuery {
    added: Option<i64>,
}

async fn home(
    current: CurrentUser,
    Query(query): Query<HomeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    Ok(AskamaTemplateResponse::into_response(HomeTemplate {
        email: user.to_string(),
        added: query.added.is_some(),
        show_error: false,
        error_message: String::new(),
        form: TripFormValues::default(),
    }))
}

async fn trip_add(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(draft): Form<TripDraft>,
) -> Result<Response, AppError> {
    let user = current.require_user()?.clone();
    let owner = user.clone();
    let submitted = draft.clone();
    match state
        .with_trips(move |trips| trips.add(&owner, &submitted))
        .await
    {
        Ok(trip) => Ok(Redirect::to(&format!("/me?added={}", trip.id)).into_response()),
        Err(AppError::Validation(err)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            AskamaTemplateResponse::into_response(HomeTemplate {
                email: user.to_string(),
                added: false,
                show_error: true,
                error_message: err.to_string(),
                form: TripFormValues::from(&draft),
            }),
        )
            .into_response()),
        Err(err) => Err(err),
    }
}

#[derive(Clone)]
struct TripSummary {
    id: i64,
    destination: String,
    start_date: String,
    end_date: String,
    budget: String,
    notes: String,
}

impl From<TripRecord> for TripSummary {
    fn from(trip: TripRecord) -> Self {
        Self {
            id: trip.id,
            start_date: trip.start_date.format(DATE_FORMAT).to_string(),
            end_date: trip.end_date.format(DATE_FORMAT).to_string(),
            budget: format_budget(trip.budget),
            notes: trip.notes_display().to_string(),
            destination: trip.destination,
        }
    }
}

#[derive(Template)]
#[template(path = "user/trips_list.html")]
struct TripsListTemplate {
    email: String,
    trips: Vec<TripSummary>,
}

async fn trips_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?.clone();
    let owner = user.clone();
    let items = state.with_trips(move |trips| trips.load(&owner)).await?;
    Ok(AskamaTemplateResponse::into_response(TripsListTemplate {
        email: user.to_string(),
        trips: items.into_iter().map(TripSummary::from).collect(),
    }))
}

#[derive(Template)]
#[template(path = "user/trip_edit.html")]
struct TripEditTemplate {
    id: i64,
    show_error: bool,
    error_message: String,
    form: TripFormValues,
}

async fn trip_edit_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?.clone();
    let trip = state
        .with_trips(move |trips| trips.find(&user, trip_id))
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(AskamaTemplateResponse::into_response(TripEditTemplate {
        id: trip.id,
        show_error: false,
        error_message: String::new(),
        form: TripFormValues::from(&trip),
    }))
}

async fn trip_edit_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Form(patch): Form<TripPatch>,
) -> Result<Response, AppError> {
    let user = current.require_user()?.clone();
    let owner = user.clone();
    let submitted = patch.clone();
    let err = match state
        .with_trips(move |trips| trips.update(&owner, trip_id, submitted))
        .await
    {
        Ok(_) => return Ok(Redirect::to("/me/trips").into_response()),
        Err(AppError::Validation(err)) => err,
        Err(err) => return Err(err),
    };

    let stored = state
        .with_trips(move |trips| trips.find(&user, trip_id))
        .await?
        .ok_or(AppError::NotFound)?;
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        AskamaTemplateResponse::into_response(TripEditTemplate {
            id: trip_id,
            show_error: true,
            error_message: err.to_string(),
            form: TripFormValues::from(&stored).overlay(patch),
        }),
    )
        .into_response())
}

async fn trip_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?.clone();
    state
        .with_trips(move |trips| trips.remove(&user, trip_id))
        .await?;
    Ok(Redirect::to("/me/trips"))
}

#[derive(Template)]
#[template(path = "user/dashboard.html")]
struct DashboardTemplate {
    email: String,
    total_trips: usize,
    total_budget: String,
    upcoming: String,
}

async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?.clone();
    let owner = user.clone();
    let items = state.with_trips(move |trips| trips.load(&owner)).await?;
    let summary = Dashboard::compute(&items, Local::now().date_naive());
    Ok(AskamaTemplateResponse::into_response(DashboardTemplate {
        email: user.to_string(),
        total_trips: summary.total_trips,
        total_budget: format_budget(summary.total_budget),
        upcoming: summary.upcoming_destination().to_string(),
    }))
}

fn format_budget(budget: f64) -> String {
    budget.to_string()
}
