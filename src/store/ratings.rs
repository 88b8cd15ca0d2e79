use dashmap::DashMap;
use uuid::Uuid;

use crate::models::rating::Rating;

#[derive(Default)]
pub struct RatingStore {
    ratings: DashMap<Uuid, Rating>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn insert(&self, rating: Rating) -> Rating {
        self.ratings.insert(rating.id, rating.clone());
        rating
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Rating> {
        let mut ratings: Vec<Rating> = self
            .ratings
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ratings
    }
}
