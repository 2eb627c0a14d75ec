mod admin;
mod common;
mod registration;
mod submission;
