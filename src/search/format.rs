use std::time::Duration;

/// Compact duration text such as `850ms`, `4.5s`, `1m2.25s` or `1h0m3s`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if duration < Duration::from_secs(1) {
        let (unit, divisor, digits) = if nanos >= 1_000_000 {
            ("ms", 1_000_000, 6)
        } else if nanos >= 1_000 {
            ("µs", 1_000, 3)
        } else {
            ("ns", 1, 0)
        };
        return format!(
            "{}{unit}",
            decimal(nanos / divisor, nanos % divisor, digits)
        );
    }

    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    let seconds = decimal(
        u128::from(seconds),
        u128::from(duration.subsec_nanos()),
        9,
    );

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn decimal(whole: u128, fraction: u128, digits: usize) -> String {
    if fraction == 0 || digits == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:0digits$}");
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}
