mod submission;
mod team;

pub use submission::{NewSubmission, SubmissionOutcome, SubmissionRegistry, SubmissionStatsRow};
pub use team::{PaymentEvidence, TeamConflict, TeamRegistry};
