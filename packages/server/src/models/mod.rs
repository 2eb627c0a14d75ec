pub mod admin;
pub mod auth;
pub mod registration;
pub mod shared;
pub mod team;
pub mod upload;
