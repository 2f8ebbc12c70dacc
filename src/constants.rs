use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

/// Process start, for the uptime reported by the health check.
pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);
