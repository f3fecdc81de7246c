use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod competition;
pub mod health;
pub mod sse;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Current wall-clock time formatted as RFC 3339.
pub fn now_rfc3339() -> String {
    format_system_time(SystemTime::now())
}
