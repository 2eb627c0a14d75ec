mod service;
pub mod sweeper;

pub use service::{IssuedOtp, OtpError, OtpService, generate_code, purge_expired};
