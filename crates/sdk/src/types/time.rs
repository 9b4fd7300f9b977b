use super::Timestamp;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Human-readable distance between `timestamp` and `now`, e.g.
/// "a few seconds ago", "5 minutes ago" or "in 2 days".
pub fn relative_time(timestamp: Timestamp, now: Timestamp) -> String {
    let (elapsed, future) = if timestamp > now {
        (timestamp - now, true)
    } else {
        (now - timestamp, false)
    };

    let phrase = distance(elapsed);
    if future { format!("in {}", phrase) } else { format!("{} ago", phrase) }
}

fn distance(seconds: u64) -> String {
    let rounded = |unit: u64| (seconds + unit / 2) / unit;
    let days = rounded(DAY);

    match seconds {
        0..45 => "a few seconds".to_string(),
        45..90 => "a minute".to_string(),
        s if s < 45 * MINUTE => format!("{} minutes", rounded(MINUTE)),
        s if s < 90 * MINUTE => "an hour".to_string(),
        s if s < 22 * HOUR => format!("{} hours", rounded(HOUR)),
        s if s < 36 * HOUR => "a day".to_string(),
        _ if days <= 25 => format!("{} days", days),
        _ if days <= 45 => "a month".to_string(),
        _ if days < 320 => format!("{} months", ((days as f64) / 30.4).round() as u64),
        _ if days < 548 => "a year".to_string(),
        _ => format!("{} years", ((days as f64) / 365.25).round() as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Timestamp = 1_700_000_000;

    #[test]
    fn past_distances() {
        assert_eq!(relative_time(NOW, NOW), "a few seconds ago");
        assert_eq!(relative_time(NOW - 44, NOW), "a few seconds ago");
        assert_eq!(relative_time(NOW - 60, NOW), "a minute ago");
        assert_eq!(relative_time(NOW - 5 * MINUTE, NOW), "5 minutes ago");
        assert_eq!(relative_time(NOW - HOUR, NOW), "an hour ago");
        assert_eq!(relative_time(NOW - 3 * HOUR, NOW), "3 hours ago");
        assert_eq!(relative_time(NOW - 30 * HOUR, NOW), "a day ago");
        assert_eq!(relative_time(NOW - 4 * DAY, NOW), "4 days ago");
        assert_eq!(relative_time(NOW - 40 * DAY, NOW), "a month ago");
        assert_eq!(relative_time(NOW - 120 * DAY, NOW), "4 months ago");
        assert_eq!(relative_time(NOW - 400 * DAY, NOW), "a year ago");
        assert_eq!(relative_time(NOW - 3 * 365 * DAY, NOW), "3 years ago");
    }

    #[test]
    fn future_distance() {
        assert_eq!(relative_time(NOW + 2 * DAY, NOW), "in 2 days");
    }
}
