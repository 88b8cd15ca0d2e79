use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::Utc;

use crate::api::rest::extract::ApiJson;
use crate::error::AppError;
use crate::events::Event;
use crate::models::rating::{NewRating, Rating};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/ratings", get(list_ratings).post(create_rating))
}

async fn create_rating(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewRating>,
) -> Result<(StatusCode, Json<Rating>), AppError> {
    payload.validate().map_err(AppError::Validation)?;
    let order = state.coordinator.find_order(payload.order_id.trim())?;

    let rating = state.ratings.insert(payload.into_rating(Utc::now()));
    tracing::info!(
        order_id = %order.order_id,
        rating = rating.rating,
        sentiment = ?rating.sentiment,
        "order rated"
    );
    state.events.publish_global(Event::RatingCreated(rating.clone()));
    Ok((StatusCode::CREATED, Json(rating)))
}

async fn list_ratings(State(state): State<Arc<AppState>>) -> Json<Vec<Rating>> {
    Json(state.ratings.list())
}
