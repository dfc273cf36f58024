pub mod admin;
pub mod client;
pub mod health;
pub mod payment;
