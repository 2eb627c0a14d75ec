pub mod admin;
pub mod otp;
pub mod ppt_submission;
pub mod team;
pub mod team_member;
