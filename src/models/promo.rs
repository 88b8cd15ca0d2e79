use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub code: String,
    pub discount_percent: f64,
    pub usage_limit: u32,
    pub used_count: u32,
    pub applicable_categories: Vec<String>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let not_expired = self.expires_at.is_none_or(|expires_at| expires_at > now);
        self.is_active && not_expired && self.used_count < self.usage_limit
    }

    /// An empty category list means the code applies to every category.
    pub fn applies_to(&self, category: &str) -> bool {
        self.applicable_categories.is_empty()
            || self
                .applicable_categories
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(category))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoView {
    #[serde(flatten)]
    pub promo: PromoCode,
    pub is_valid: bool,
}

impl From<PromoCode> for PromoView {
    fn from(promo: PromoCode) -> Self {
        let is_valid = promo.is_valid_at(Utc::now());
        Self { promo, is_valid }
    }
}
