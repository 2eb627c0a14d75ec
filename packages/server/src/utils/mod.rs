pub mod email;
pub mod filename;
pub mod hash;
pub mod jwt;
pub mod lockout;
pub mod rate_limit;
pub mod submission;
pub mod upload;
