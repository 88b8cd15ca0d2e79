use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::coordinator::OrderOrigin;
use crate::api::rest::extract::ApiJson;
use crate::error::AppError;
use crate::models::order::{NewOrder, Order, OrderStatus};
use crate::models::rider::Rider;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/user/:email", get(list_user_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(update_status))
        .route("/orders/:id/assign-rider", patch(assign_rider))
        .route("/orders/:id/ping", post(ping_kitchen))
        .route("/orders/:id/acknowledge-ping", post(acknowledge_ping))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRiderRequest {
    #[serde(default)]
    pub rider_id: Option<Uuid>,
}

/// Order with its assigned rider resolved.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub rider: Option<Rider>,
}

impl OrderView {
    fn build(state: &AppState, order: Order) -> Self {
        let rider = order.assigned_rider.and_then(|id| state.riders.get(id));
        Self { order, rider }
    }
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewOrder>,
) -> Result<(StatusCode, Json<OrderView>), AppError> {
    let outcome = state
        .coordinator
        .create_order(payload, OrderOrigin::Storefront)?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(OrderView::build(&state, outcome.order))))
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<OrderView>> {
    let orders = state
        .orders
        .list(None)
        .into_iter()
        .map(|order| OrderView::build(&state, order))
        .collect();
    Json(orders)
}

async fn list_user_orders(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Json<Vec<OrderView>> {
    let orders = state
        .orders
        .list(Some(&email))
        .into_iter()
        .map(|order| OrderView::build(&state, order))
        .collect();
    Json(orders)
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, AppError> {
    let order = state.coordinator.find_order(&id)?;
    Ok(Json(OrderView::build(&state, order)))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> Result<Json<OrderView>, AppError> {
    let order = state
        .coordinator
        .update_status(&id, payload.status, payload.source.as_deref())?;
    Ok(Json(OrderView::build(&state, order)))
}

async fn assign_rider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<AssignRiderRequest>,
) -> Result<Json<OrderView>, AppError> {
    let order = state.coordinator.assign_rider(&id, payload.rider_id)?;
    Ok(Json(OrderView::build(&state, order)))
}

async fn ping_kitchen(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, AppError> {
    let order = state.coordinator.ping_kitchen(&id)?;
    Ok(Json(OrderView::build(&state, order)))
}

async fn acknowledge_ping(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, AppError> {
    let order = state.coordinator.acknowledge_ping(&id)?;
    Ok(Json(OrderView::build(&state, order)))
}
