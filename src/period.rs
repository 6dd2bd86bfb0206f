use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
    ("h", 3_600_000.0),
];

/// Parse poll periods like "5m", "30s", "1.5h", "250ms"
pub fn parse_period(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.parse()?;
            if !val.is_finite() || val <= 0.0 {
                bail!("Poll period must be positive: {}", s);
            }
            let period = Duration::from_millis((val * multiplier) as u64);
            if period.is_zero() {
                bail!("Poll period rounds down to zero: {}", s);
            }
            return Ok(period);
        }
    }

    bail!("Unknown period format: {}", s)
}

/// Format a poll period for display
pub fn format_period(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else if millis % 3_600_000 == 0 {
        format!("{}h", millis / 3_600_000)
    } else if millis % 60_000 == 0 {
        format!("{}m", millis / 60_000)
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}
