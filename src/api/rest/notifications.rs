use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::api::rest::extract::ApiJson;
use crate::error::AppError;
use crate::models::subscription::WebPushEndpoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notifications/vapid-public-key", get(vapid_public_key))
        .route("/notifications/subscribe", post(subscribe))
}

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    pub subscription: WebPushEndpoint,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub public_key: String,
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    pub message: &'static str,
}

async fn vapid_public_key(State(state): State<Arc<AppState>>) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        public_key: state.vapid_public_key.clone(),
    })
}

async fn subscribe(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscribeResponse>), AppError> {
    if !payload.email.contains('@') {
        return Err(AppError::Validation(format!(
            "invalid email address: {}",
            payload.email
        )));
    }
    payload
        .subscription
        .validate()
        .map_err(AppError::Validation)?;

    let saved = state
        .subscriptions
        .upsert(&payload.email, payload.subscription);
    tracing::info!(email = %saved.email, "push subscription saved");

    Ok((
        StatusCode::CREATED,
        Json(SubscribeResponse {
            message: "Subscription saved",
        }),
    ))
}
