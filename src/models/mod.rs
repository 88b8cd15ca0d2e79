pub mod order;
pub mod product;
pub mod promo;
pub mod rating;
pub mod rider;
pub mod settings;
pub mod subscription;
pub mod user;
