use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::rider::{GeoPoint, Rider, RiderLocation, RiderStatus};

#[derive(Default)]
pub struct RiderRegistry {
    riders: DashMap<Uuid, Rider>,
    by_email: DashMap<String, Uuid>,
}

impl RiderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.riders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }

    /// Registers a rider as `Available`. Emails are unique, case-insensitively.
    pub fn register(&self, name: String, phone: String, email: String) -> Result<Rider, AppError> {
        let email = email.trim().to_lowercase();
        let Entry::Vacant(slot) = self.by_email.entry(email.clone()) else {
            return Err(AppError::Conflict(format!("rider {email} already exists")));
        };

        let now = Utc::now();
        let rider = Rider {
            id: Uuid::new_v4(),
            name,
            phone,
            email,
            status: RiderStatus::Available,
            location: None,
            created_at: now,
            updated_at: now,
        };

        self.riders.insert(rider.id, rider.clone());
        slot.insert(rider.id);
        Ok(rider)
    }

    pub fn get(&self, id: Uuid) -> Option<Rider> {
        self.riders.get(&id).map(|rider| rider.clone())
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.riders.contains_key(&id)
    }

    pub fn list(&self) -> Vec<Rider> {
        let mut riders: Vec<Rider> = self
            .riders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        riders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        riders
    }

    pub fn update<F>(&self, id: Uuid, mutate: F) -> Result<Rider, AppError>
    where
        F: FnOnce(&mut Rider),
    {
        let mut rider = self
            .riders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("rider {id} not found")))?;

        mutate(&mut rider);
        rider.updated_at = Utc::now();
        Ok(rider.clone())
    }

    pub fn set_status(&self, id: Uuid, status: RiderStatus) -> Result<Rider, AppError> {
        self.update(id, |rider| rider.status = status)
    }

    /// Moves a busy rider back to `Available`.
    ///
    /// Returns `None` when the rider was not busy, so an administrator's
    /// `Offline`/`Suspended` is never overridden.
    pub fn release(&self, id: Uuid) -> Result<Option<Rider>, AppError> {
        let mut rider = self
            .riders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("rider {id} not found")))?;

        if rider.status != RiderStatus::Busy {
            return Ok(None);
        }

        rider.status = RiderStatus::Available;
        rider.updated_at = Utc::now();
        Ok(Some(rider.clone()))
    }

    pub fn update_location(&self, id: Uuid, point: GeoPoint) -> Result<Rider, AppError> {
        self.update(id, |rider| {
            rider.location = Some(RiderLocation {
                lat: point.lat,
                lng: point.lng,
                updated_at: Utc::now(),
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RiderRegistry;
    use crate::models::rider::RiderStatus;

    #[test]
    fn release_only_touches_busy_riders() {
        let registry = RiderRegistry::new();
        let rider = registry
            .register(
                "Tunde".to_string(),
                "0800".to_string(),
                "tunde@example.com".to_string(),
            )
            .unwrap();

        registry.set_status(rider.id, RiderStatus::Suspended).unwrap();
        assert!(registry.release(rider.id).unwrap().is_none());
        assert_eq!(registry.get(rider.id).unwrap().status, RiderStatus::Suspended);

        registry.set_status(rider.id, RiderStatus::Busy).unwrap();
        let released = registry.release(rider.id).unwrap().unwrap();
        assert_eq!(released.status, RiderStatus::Available);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let registry = RiderRegistry::new();
        registry
            .register("A".to_string(), "1".to_string(), "a@example.com".to_string())
            .unwrap();

        let duplicate =
            registry.register("B".to_string(), "2".to_string(), "A@Example.com".to_string());
        assert!(duplicate.is_err());
        assert_eq!(registry.len(), 1);
    }
}
