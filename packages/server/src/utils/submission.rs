use chrono::{DateTime, Duration, Utc};

/// Deadline for a team's presentation: registration time plus the window.
pub fn submission_deadline(registered_at: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    registered_at + Duration::days(window_days)
}

/// Late strictly after the deadline; the deadline instant itself is on time.
pub fn is_late(submitted_at: DateTime<Utc>, deadline: DateTime<Utc>) -> bool {
    submitted_at > deadline
}

/// Version for a new submission given the team's current highest version.
pub fn next_version(current_max: Option<i32>) -> i32 {
    current_max.map_or(1, |v| v + 1)
}
