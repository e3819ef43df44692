//! Tick-based date/time formatting and parsing.
//!
//! Date/time and duration values travel as 100-nanosecond ticks. Date ticks
//! count from 0001-01-01T00:00:00 in the proleptic Gregorian calendar.

const TICKS_PER_SECOND: u64 = 10_000_000;
const TICKS_PER_MINUTE: u64 = 60 * TICKS_PER_SECOND;
const TICKS_PER_HOUR: u64 = 60 * TICKS_PER_MINUTE;
const TICKS_PER_DAY: u64 = 24 * TICKS_PER_HOUR;

/// Days between 0001-01-01 and 1970-01-01.
const DAYS_TO_UNIX_EPOCH: i64 = 719_162;

/// Error type for date/time parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

fn parse_error(input: &str) -> DateTimeParseError {
    DateTimeParseError {
        message: format!("Invalid date/time: {}", input),
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Days since the Unix epoch for a civil date (Howard Hinnant's algorithm).
fn date_to_days(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let m = if month <= 2 {
        month as i64 + 9
    } else {
        month as i64 - 3
    };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let doy = (153 * m + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era * 146_097 + doe - 719_468
}

/// Civil date for days since the Unix epoch.
fn days_to_date(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;

    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Formats date ticks as `yyyy-MM-ddTHH:mm:ss.fffffff`.
pub fn format_ticks(ticks: u64) -> String {
    let days = (ticks / TICKS_PER_DAY) as i64;
    let rem = ticks % TICKS_PER_DAY;
    let (year, month, day) = days_to_date(days - DAYS_TO_UNIX_EPOCH);

    let hour = rem / TICKS_PER_HOUR;
    let minute = (rem % TICKS_PER_HOUR) / TICKS_PER_MINUTE;
    let second = (rem % TICKS_PER_MINUTE) / TICKS_PER_SECOND;
    let fraction = rem % TICKS_PER_SECOND;

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:07}",
        year, month, day, hour, minute, second, fraction
    )
}

/// Parses `yyyy-MM-ddTHH:mm:ss[.f{1,7}]` into date ticks.
///
/// A trailing `Z` is accepted and returned as the second element so callers
/// can pick the matching kind.
pub fn parse_ticks(input: &str) -> Result<(u64, bool), DateTimeParseError> {
    let (body, utc) = match input.strip_suffix('Z') {
        Some(body) => (body, true),
        None => (input, false),
    };

    let bytes = body.as_bytes();
    if bytes.len() < 19
        || bytes[4] != b'-'
        || bytes[7] != b'-'
        || bytes[10] != b'T'
        || bytes[13] != b':'
        || bytes[16] != b':'
    {
        return Err(parse_error(input));
    }

    let field = |range: std::ops::Range<usize>| -> Result<u32, DateTimeParseError> {
        body.get(range)
            .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| parse_error(input))
    };

    let year = field(0..4)? as i64;
    let month = field(5..7)?;
    let day = field(8..10)?;
    let hour = field(11..13)? as u64;
    let minute = field(14..16)? as u64;
    let second = field(17..19)? as u64;

    if year < 1
        || !(1..=12).contains(&month)
        || day < 1
        || day > days_in_month(year, month)
        || hour > 23
        || minute > 59
        || second > 59
    {
        return Err(parse_error(input));
    }

    let fraction = match &body[19..] {
        "" => 0,
        rest => {
            let digits = rest.strip_prefix('.').ok_or_else(|| parse_error(input))?;
            if digits.is_empty()
                || digits.len() > 7
                || !digits.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(parse_error(input));
            }
            let mut padded = digits.to_string();
            while padded.len() < 7 {
                padded.push('0');
            }
            padded.parse::<u64>().map_err(|_| parse_error(input))?
        }
    };

    let days = (date_to_days(year, month, day) + DAYS_TO_UNIX_EPOCH) as u64;
    let ticks = days * TICKS_PER_DAY
        + hour * TICKS_PER_HOUR
        + minute * TICKS_PER_MINUTE
        + second * TICKS_PER_SECOND
        + fraction;

    Ok((ticks, utc))
}

/// Formats a signed duration in the constant format `[-][d.]hh:mm:ss[.fffffff]`.
pub fn format_duration(ticks: i64) -> String {
    let negative = ticks < 0;
    let abs = ticks.unsigned_abs();

    let days = abs / TICKS_PER_DAY;
    let hours = (abs % TICKS_PER_DAY) / TICKS_PER_HOUR;
    let minutes = (abs % TICKS_PER_HOUR) / TICKS_PER_MINUTE;
    let seconds = (abs % TICKS_PER_MINUTE) / TICKS_PER_SECOND;
    let fraction = abs % TICKS_PER_SECOND;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{}.", days));
    }
    out.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    if fraction > 0 {
        out.push_str(&format!(".{:07}", fraction));
    }
    out
}
