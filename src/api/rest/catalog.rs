use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::rest::extract::ApiJson;
use crate::error::AppError;
use crate::events::Event;
use crate::models::product::ProductView;
use crate::models::promo::{PromoCode, PromoView};
use crate::models::settings::{clock_time, Settings};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settings", get(get_settings).patch(update_settings))
        .route("/products", get(list_products).post(create_product))
        .route("/promos", get(list_promos).post(create_promo))
        .route("/promos/validate", post(validate_promo))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub is_open: Option<bool>,
    #[serde(default)]
    pub opening_time: Option<String>,
    #[serde(default)]
    pub closing_time: Option<String>,
    #[serde(default)]
    pub delivery_fee: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub is_manual_best_seller: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromoRequest {
    pub code: String,
    pub discount_percent: f64,
    pub usage_limit: u32,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePromoRequest {
    pub code: String,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
}

#[derive(Deserialize)]
pub struct CartItem {
    pub category: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoQuote {
    pub code: String,
    pub discount_percent: f64,
    pub applicable_categories: Vec<String>,
}

fn active_by_default() -> bool {
    true
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.catalog.settings())
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<UpdateSettingsRequest>,
) -> Result<Json<Settings>, AppError> {
    let opening_time = payload
        .opening_time
        .as_deref()
        .map(clock_time::parse)
        .transpose()
        .map_err(AppError::Validation)?;
    let closing_time = payload
        .closing_time
        .as_deref()
        .map(clock_time::parse)
        .transpose()
        .map_err(AppError::Validation)?;

    if payload.delivery_fee.is_some_and(|fee| fee < 0.0) {
        return Err(AppError::Validation("deliveryFee cannot be negative".to_string()));
    }

    let settings = state.catalog.update_settings(|settings| {
        if let Some(is_open) = payload.is_open {
            settings.is_open = is_open;
        }
        if let Some(opening_time) = opening_time {
            settings.opening_time = opening_time;
        }
        if let Some(closing_time) = closing_time {
            settings.closing_time = closing_time;
        }
        if let Some(delivery_fee) = payload.delivery_fee {
            settings.delivery_fee = delivery_fee;
        }
    });

    tracing::info!(
        is_open = settings.is_open,
        opening_time = %settings.opening_time,
        closing_time = %settings.closing_time,
        "settings updated"
    );
    state
        .events
        .publish_global(Event::SettingsUpdated(settings.clone()));
    Ok(Json(settings))
}

async fn list_products(State(state): State<Arc<AppState>>) -> Json<Vec<ProductView>> {
    Json(
        state
            .catalog
            .products()
            .into_iter()
            .map(ProductView::from)
            .collect(),
    )
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductView>), AppError> {
    if payload.id.trim().is_empty() || payload.category.trim().is_empty() {
        return Err(AppError::Validation(
            "product id and category are required".to_string(),
        ));
    }

    let product = state.catalog.register_product(
        payload.id.trim().to_string(),
        payload.name,
        payload.category.trim().to_string(),
        payload.is_manual_best_seller,
    )?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

async fn list_promos(State(state): State<Arc<AppState>>) -> Json<Vec<PromoView>> {
    Json(
        state
            .catalog
            .promos()
            .into_iter()
            .map(PromoView::from)
            .collect(),
    )
}

async fn create_promo(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreatePromoRequest>,
) -> Result<(StatusCode, Json<PromoView>), AppError> {
    let promo = state.catalog.create_promo(PromoCode {
        code: payload.code,
        discount_percent: payload.discount_percent,
        usage_limit: payload.usage_limit,
        used_count: 0,
        applicable_categories: payload.applicable_categories,
        is_active: payload.is_active,
        expires_at: payload.expires_at,
        created_at: Utc::now(),
    })?;

    Ok((StatusCode::CREATED, Json(promo.into())))
}

async fn validate_promo(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ValidatePromoRequest>,
) -> Result<Json<PromoQuote>, AppError> {
    let categories: Vec<String> = payload
        .cart_items
        .into_iter()
        .map(|item| item.category)
        .collect();
    let promo = state.catalog.validate_promo(&payload.code, &categories)?;

    Ok(Json(PromoQuote {
        code: promo.code,
        discount_percent: promo.discount_percent,
        applicable_categories: promo.applicable_categories,
    }))
}
