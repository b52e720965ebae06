pub mod account;
pub mod auth;
pub mod help;
pub mod pages;
pub mod passenger;
pub mod rider;
