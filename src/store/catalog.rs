use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::AppError;
use crate::models::order::CustomerSnapshot;
use crate::models::product::Product;
use crate::models::promo::PromoCode;
use crate::models::settings::Settings;
use crate::models::user::UserProfile;

/// Products, promo codes, user profiles and the settings singleton.
#[derive(Default)]
pub struct Catalog {
    products: DashMap<String, Product>,
    next_seq: AtomicU64,
    promos: DashMap<String, PromoCode>,
    users: DashMap<String, UserProfile>,
    settings: RwLock<Settings>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_product(
        &self,
        id: String,
        name: String,
        category: String,
        is_manual_best_seller: bool,
    ) -> Result<Product, AppError> {
        match self.products.entry(id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!("product {id} already exists"))),
            Entry::Vacant(entry) => {
                let product = Product {
                    id,
                    name,
                    category,
                    sales_count: 0,
                    is_automated_best_seller: false,
                    is_manual_best_seller,
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                };
                entry.insert(product.clone());
                Ok(product)
            }
        }
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.products.get(id).map(|product| product.clone())
    }

    /// Products in insertion order.
    pub fn products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        products.sort_by_key(|product| product.seq);
        products
    }

    pub fn reset_rankings(&self) {
        for mut entry in self.products.iter_mut() {
            entry.sales_count = 0;
            entry.is_automated_best_seller = false;
        }
    }

    /// Returns `false` when the product is unknown to the catalog.
    pub fn set_sales_count(&self, id: &str, sales_count: u64) -> bool {
        match self.products.get_mut(id) {
            Some(mut product) => {
                product.sales_count = sales_count;
                true
            }
            None => false,
        }
    }

    pub fn mark_automated_best_seller(&self, id: &str) -> bool {
        match self.products.get_mut(id) {
            Some(mut product) => {
                product.is_automated_best_seller = true;
                true
            }
            None => false,
        }
    }

    pub fn create_promo(&self, mut promo: PromoCode) -> Result<PromoCode, AppError> {
        promo.code = promo.code.trim().to_uppercase();
        if promo.code.is_empty() {
            return Err(AppError::Validation("promo code cannot be empty".to_string()));
        }
        if !(0.0..=100.0).contains(&promo.discount_percent) {
            return Err(AppError::Validation(
                "discountPercent must be between 0 and 100".to_string(),
            ));
        }
        if promo.usage_limit == 0 {
            return Err(AppError::Validation("usageLimit must be >= 1".to_string()));
        }

        match self.promos.entry(promo.code.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "promo code {} already exists",
                promo.code
            ))),
            Entry::Vacant(entry) => {
                entry.insert(promo.clone());
                Ok(promo)
            }
        }
    }

    pub fn promos(&self) -> Vec<PromoCode> {
        let mut promos: Vec<PromoCode> = self
            .promos
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        promos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        promos
    }

    /// Atomically bumps the usage counter of `code`.
    ///
    /// The order has already been paid with the discount applied, so the
    /// counter moves even for an inactive, expired or exhausted code and may
    /// pass `usage_limit`. Such redemptions are logged.
    pub fn redeem_promo(&self, code: &str) -> Result<PromoCode, AppError> {
        let code = code.trim().to_uppercase();
        let mut promo = self
            .promos
            .get_mut(&code)
            .ok_or_else(|| AppError::NotFound(format!("promo code {code} not found")))?;

        if !promo.is_valid_at(Utc::now()) {
            tracing::warn!(
                code = %promo.code,
                used_count = promo.used_count,
                usage_limit = promo.usage_limit,
                is_active = promo.is_active,
                "redeeming promo code that is no longer valid"
            );
        }
        promo.used_count = promo.used_count.saturating_add(1);
        Ok(promo.clone())
    }

    /// Checks whether `code` can be applied to a cart holding `categories`.
    pub fn validate_promo(&self, code: &str, categories: &[String]) -> Result<PromoCode, AppError> {
        let code = code.trim().to_uppercase();
        let promo = self
            .promos
            .get(&code)
            .map(|promo| promo.clone())
            .ok_or_else(|| AppError::NotFound(format!("promo code {code} not found")))?;

        if !promo.is_active {
            return Err(AppError::Validation("this promo is no longer active".to_string()));
        }
        if promo.used_count >= promo.usage_limit {
            return Err(AppError::Validation(
                "this promo has reached its usage limit".to_string(),
            ));
        }
        if promo.expires_at.is_some_and(|expires_at| expires_at <= Utc::now()) {
            return Err(AppError::Validation("this promo has expired".to_string()));
        }
        let applicable = promo.applicable_categories.is_empty()
            || categories.iter().any(|category| promo.applies_to(category));
        if !applicable {
            return Err(AppError::Validation(format!(
                "this promo is only valid for categories: {}",
                promo.applicable_categories.join(", ")
            )));
        }

        Ok(promo)
    }

    pub fn upsert_user(&self, snapshot: &CustomerSnapshot, seen_at: DateTime<Utc>) -> UserProfile {
        let email = snapshot.email.trim().to_lowercase();
        let mut profile = self
            .users
            .entry(email.clone())
            .or_insert_with(|| UserProfile {
                email,
                phone: None,
                address: None,
                last_seen: seen_at,
                created_at: seen_at,
            });

        if snapshot.phone.is_some() {
            profile.phone.clone_from(&snapshot.phone);
        }
        if snapshot.address.is_some() {
            profile.address.clone_from(&snapshot.address);
        }
        profile.last_seen = seen_at;
        profile.clone()
    }

    pub fn user(&self, email: &str) -> Option<UserProfile> {
        self.users
            .get(&email.trim().to_lowercase())
            .map(|profile| profile.clone())
    }

    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_settings<F>(&self, mutate: F) -> Settings
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        mutate(&mut settings);
        settings.updated_at = Utc::now();
        settings.clone()
    }
}
