use chrono::{DateTime, Utc};
use rand::{Rng, distr::Alphanumeric};

pub const STATE_LENGTH: usize = 16;

/// Generates the anti-CSRF `state` value for a login round trip.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Human-readable time left until `expiry`, e.g. `"59m"` or `"expired"`.
pub fn describe_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = expiry - now;
    if left.num_seconds() <= 0 {
        return "expired".to_string();
    }

    let hours = left.num_hours();
    let minutes = left.num_minutes() % 60;
    match (hours, minutes) {
        (0, 0) => format!("{}s", left.num_seconds()),
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m}m"),
    }
}
