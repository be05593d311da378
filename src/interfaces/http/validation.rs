use crate::domain::subscription::MIN_RECURRENCE_INTERVAL_SECS;
use crate::error::ZapError;

/// Parses a human interval like "24h", "7d", "90m" or "3600s" into seconds.
/// Rejects anything under the one-hour floor.
pub fn parse_recurrence_interval(raw: &str) -> Result<u64, ZapError> {
    let raw = raw.trim();
    let unit = raw.chars().next_back();
    let digits = &raw[..raw.len() - unit.map_or(0, char::len_utf8)];
    let secs_per_unit: u64 = match unit {
        Some('s') => 1,
        Some('m') => 60,
        Some('h') => 60 * 60,
        Some('d') => 24 * 60 * 60,
        _ => {
            return Err(ZapError::BadRequest(format!(
                "invalid sleep duration '{}': expected a number with an s/m/h/d suffix",
                raw
            )));
        }
    };
    let value: u64 = digits.parse().map_err(|_| {
        ZapError::BadRequest(format!("invalid sleep duration '{}'", raw))
    })?;
    let secs = value.checked_mul(secs_per_unit).ok_or_else(|| {
        ZapError::BadRequest(format!("sleep duration '{}' is out of range", raw))
    })?;
    if secs < MIN_RECURRENCE_INTERVAL_SECS {
        return Err(ZapError::BadRequest(
            "sleep duration must be at least one hour".to_string(),
        ));
    }
    Ok(secs)
}
