pub mod admin_role;
pub mod otp_purpose;
pub mod payment_status;
pub mod review_status;
pub mod storage;

mod parse;

pub use admin_role::AdminRole;
pub use otp_purpose::OtpPurpose;
pub use parse::ParseEnumError;
pub use payment_status::PaymentStatus;
pub use review_status::ReviewStatus;
