use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Classifies a 1-5 star score.
    pub fn from_stars(stars: u8) -> Self {
        match stars {
            4.. => Sentiment::Positive,
            3 => Sentiment::Neutral,
            _ => Sentiment::Negative,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub order_id: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub sentiment: Sentiment,
    /// `rating` mapped onto `[-1.0, 1.0]`.
    pub sentiment_score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRating {
    pub order_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NewRating {
    pub fn validate(&self) -> Result<(), String> {
        if self.order_id.trim().is_empty() {
            return Err("orderId is required".to_string());
        }
        if !(1..=5).contains(&self.rating) {
            return Err(format!("rating must be between 1 and 5, got {}", self.rating));
        }
        Ok(())
    }

    pub fn into_rating(self, now: DateTime<Utc>) -> Rating {
        let comment = self
            .comment
            .map(|comment| comment.trim().to_string())
            .filter(|comment| !comment.is_empty());

        Rating {
            id: Uuid::new_v4(),
            order_id: self.order_id.trim().to_string(),
            rating: self.rating,
            comment,
            sentiment: Sentiment::from_stars(self.rating),
            sentiment_score: (f64::from(self.rating) - 3.0) / 2.0,
            created_at: now,
        }
    }
}
