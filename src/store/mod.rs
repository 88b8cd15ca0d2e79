pub mod catalog;
pub mod orders;
pub mod ratings;
pub mod riders;
pub mod subscriptions;

pub use catalog::Catalog;
pub use orders::{Insert, Lookup, OrderStore};
pub use ratings::RatingStore;
pub use riders::RiderRegistry;
pub use subscriptions::SubscriptionStore;
