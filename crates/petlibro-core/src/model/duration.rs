use tracing::warn;

/// Parse a vendor eating-time string such as `3'25''` into seconds.
///
/// Malformed input logs a warning and yields 0.
pub fn parse_eating_time(raw: &str) -> u32 {
    parse_minutes_seconds(raw).unwrap_or_else(|| {
        warn!(value = raw, "malformed eating time, reporting 0");
        0
    })
}

fn parse_minutes_seconds(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let body = trimmed.strip_suffix("''")?;
    let (minutes, seconds) = body.split_once('\'')?;

    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: u32 = seconds.trim().parse().ok()?;

    minutes.checked_mul(60)?.checked_add(seconds)
}
