pub mod auth;
pub mod offer;
pub mod registration;
pub mod ride;
pub mod rider;
