use chrono::{Duration, TimeZone, Utc};
use termify::utils::*;

#[test]
fn test_generate_state_length_and_charset() {
    let state = generate_state();
    assert_eq!(state.len(), STATE_LENGTH);
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn test_generate_state_is_not_repeated() {
    let states: std::collections::HashSet<String> = (0..50).map(|_| generate_state()).collect();
    assert_eq!(states.len(), 50);
}

#[test]
fn test_describe_expiry() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

    assert_eq!(describe_expiry(now, now), "expired");
    assert_eq!(describe_expiry(now - Duration::minutes(5), now), "expired");
    assert_eq!(describe_expiry(now + Duration::seconds(42), now), "42s");
    assert_eq!(describe_expiry(now + Duration::minutes(59), now), "59m");
    assert_eq!(
        describe_expiry(now + Duration::hours(2) + Duration::minutes(3), now),
        "2h 3m"
    );
    assert_eq!(describe_expiry(now + Duration::hours(1), now), "1h 0m");
}
