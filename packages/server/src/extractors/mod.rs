pub mod auth;
pub mod client;
pub mod json;
pub mod registration;
