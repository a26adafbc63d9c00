use std::time::Duration;

// Cue times are stored as signed 64-bit nanoseconds
const MAX_SECONDS: u64 = i64::MAX as u64 / 1_000_000_000 - 1;

/// Parse a `start --> end [settings]` timing line.
pub(crate) fn parse_timing(line: &str) -> Result<(Duration, Duration), String> {
    let (start_raw, end_raw) = line
        .split_once("-->")
        .map(|(a, b)| (a.trim(), b.trim()))
        .ok_or_else(|| "timestamp line must contain '-->'".to_string())?;

    // WebVTT cue settings follow the end timestamp
    let end_raw = end_raw.split_whitespace().next().unwrap_or_default();

    let start = parse_timestamp(start_raw)
        .map_err(|e| format!("invalid start timestamp '{start_raw}': {e}"))?;
    let end = parse_timestamp(end_raw)
        .map_err(|e| format!("invalid end timestamp '{end_raw}': {e}"))?;

    if end < start {
        return Err(format!("cue ends before it starts: {start_raw} --> {end_raw}"));
    }
    Ok((start, end))
}

/// Accepts `HH:MM:SS,mmm`, `HH:MM:SS.mmm` and `MM:SS.mmm`.
pub(crate) fn parse_timestamp(value: &str) -> Result<Duration, String> {
    let cleaned = value.trim().replace(',', ".");
    let (time_part, fractional_part) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), "0"));

    let components = time_part
        .split(':')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| format!("'{part}' is not a number"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (hours, minutes, seconds) = match components.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err("expected HH:MM:SS or MM:SS".to_string()),
    };
    if minutes >= 60 || seconds >= 60 {
        return Err("minutes and seconds must be below 60".to_string());
    }

    if fractional_part.is_empty() || !fractional_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid fractional part '{fractional_part}'"));
    }
    let mut millis_str: String = fractional_part.chars().take(3).collect();
    while millis_str.len() < 3 {
        millis_str.push('0');
    }
    let millis = millis_str
        .parse::<u64>()
        .map_err(|_| format!("invalid fractional part '{fractional_part}'"))?;

    let total_seconds = hours
        .checked_mul(3600)
        .and_then(|secs| secs.checked_add(minutes * 60 + seconds))
        .filter(|secs| *secs <= MAX_SECONDS)
        .ok_or_else(|| "timestamp out of range".to_string())?;
    Ok(Duration::from_secs(total_seconds) + Duration::from_millis(millis))
}
