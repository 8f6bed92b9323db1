//! Lossy parser for ISO-8601 style flight durations (`PT7H9M`).

/// Returned for anything that is not a `PT` duration. Large enough to push
/// the offer to the bottom of any ranking.
pub const DURATION_SENTINEL: i64 = 1_000_000_000;

/// Total minutes in a `PT..H..M` duration. Seconds and unknown designators
/// are ignored; this never fails.
pub fn parse_duration_minutes(text: &str) -> i64 {
    let Some(rest) = text.strip_prefix("PT") else {
        return DURATION_SENTINEL;
    };

    let mut hours = 0i64;
    let mut minutes = 0i64;
    let mut digits = String::new();

    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        match ch {
            'H' => hours = take_number(&mut digits),
            'M' => minutes = take_number(&mut digits),
            _ => digits.clear(),
        }
    }

    hours.saturating_mul(60).saturating_add(minutes)
}

fn take_number(digits: &mut String) -> i64 {
    let value = if digits.is_empty() {
        0
    } else {
        digits.parse::<i64>().unwrap_or(DURATION_SENTINEL)
    };
    digits.clear();
    value
}
