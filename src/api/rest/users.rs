use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::api::rest::extract::ApiJson;
use crate::error::AppError;
use crate::events::{Event, Topic};
use crate::models::order::CustomerSnapshot;
use crate::models::user::{CustomerSummary, UserProfile};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_customers))
        .route("/users/profile", post(update_profile))
        .route("/users/profile/:email", get(get_profile))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Every customer who has ordered, with totals, newest activity first.
async fn list_customers(State(state): State<Arc<AppState>>) -> Json<Vec<CustomerSummary>> {
    let customers = state
        .orders
        .customer_summaries()
        .into_iter()
        .map(|summary| {
            let profile = state.catalog.user(&summary.email);
            summary.with_profile(profile)
        })
        .collect();
    Json(customers)
}

/// Stored profile, seeded from the customer's latest order on first access.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    if let Some(profile) = state.catalog.user(&email) {
        return Ok(Json(profile));
    }

    let latest = state
        .orders
        .list(Some(&email))
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("customer {email} not found")))?;

    Ok(Json(state.catalog.upsert_user(&latest.user, Utc::now())))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    if !payload.email.contains('@') {
        return Err(AppError::Validation(format!(
            "invalid email address: {}",
            payload.email
        )));
    }

    let profile = state.catalog.upsert_user(
        &CustomerSnapshot {
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
        },
        Utc::now(),
    );

    match serde_json::to_value(&profile) {
        Ok(data) => {
            state
                .events
                .publish(Topic::user(&profile.email), Event::UserProfileUpdated(data));
        }
        Err(err) => tracing::warn!(error = %err, "failed to serialize profile event"),
    }
    Ok(Json(profile))
}
