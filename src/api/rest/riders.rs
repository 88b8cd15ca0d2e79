use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::extract::{ApiJson, ApiPath};
use crate::error::AppError;
use crate::events::Event;
use crate::models::rider::{GeoPoint, Rider, RiderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/riders", get(list_riders).post(create_rider))
        .route("/riders/:id", patch(update_rider))
        .route("/riders/:id/location", patch(update_rider_location))
}

#[derive(Deserialize)]
pub struct CreateRiderRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Administrative update. Status changes here bypass the delivery coupling.
#[derive(Deserialize)]
pub struct UpdateRiderRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<RiderStatus>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

async fn create_rider(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateRiderRequest>,
) -> Result<(StatusCode, Json<Rider>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    if payload.phone.trim().is_empty() {
        return Err(AppError::Validation("phone cannot be empty".to_string()));
    }

    if !payload.email.contains('@') {
        return Err(AppError::Validation(format!(
            "invalid email address: {}",
            payload.email
        )));
    }

    let rider = state.riders.register(
        payload.name.trim().to_string(),
        payload.phone.trim().to_string(),
        payload.email,
    )?;

    tracing::info!(rider_id = %rider.id, "rider registered");
    state.events.publish_global(Event::RiderCreated(rider.clone()));
    Ok((StatusCode::CREATED, Json(rider)))
}

async fn list_riders(State(state): State<Arc<AppState>>) -> Json<Vec<Rider>> {
    Json(state.riders.list())
}

async fn update_rider(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateRiderRequest>,
) -> Result<Json<Rider>, AppError> {
    let rider = state.riders.update(id, |rider| {
        if let Some(name) = payload.name {
            rider.name = name;
        }
        if let Some(phone) = payload.phone {
            rider.phone = phone;
        }
        if let Some(status) = payload.status {
            rider.status = status;
        }
    })?;

    tracing::info!(rider_id = %id, status = ?rider.status, "rider updated by admin");
    state.events.publish_global(Event::RiderUpdated(rider.clone()));
    Ok(Json(rider))
}

async fn update_rider_location(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateLocationRequest>,
) -> Result<Json<Rider>, AppError> {
    let GeoPoint { lat, lng } = payload.location;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::Validation(format!("invalid coordinate {lat},{lng}")));
    }

    let rider = state.riders.update_location(id, GeoPoint { lat, lng })?;
    state.events.publish_global(Event::RiderUpdated(rider.clone()));
    Ok(Json(rider))
}
