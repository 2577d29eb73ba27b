//! Excel serial dates.
//!
//! Serials count days from an epoch that depends on the workbook's date
//! system. In the 1900 system serial 0 is 1899-12-30, which absorbs Lotus'
//! phantom 1900-02-29 for every serial from 61 on. The 1904 system starts
//! 1462 days later, at 1904-01-01.

use crate::workbook_meta::DateSystem;

/// Julian Day Number of 1899-12-30.
const JDN_1900_EPOCH: i64 = 2_415_019;

/// Days between the two epochs.
const DAYS_1904_OFFSET: i64 = 1_462;

/// Serials outside this range are not dates we can meaningfully print.
const MAX_SERIAL_DAYS: f64 = 3_000_000.0;

/// Convert a serial to (year, month, day).
///
/// The time-of-day fraction is dropped. Returns `None` for non-finite or
/// out-of-range serials.
#[allow(clippy::cast_possible_truncation)]
pub fn serial_to_ymd(serial: f64, system: DateSystem) -> Option<(i32, u32, u32)> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL_DAYS {
        return None;
    }
    // Bounded above, so the cast cannot truncate.
    let days = serial.floor() as i64;
    let offset = match system {
        DateSystem::Date1900 => 0,
        DateSystem::Date1904 => DAYS_1904_OFFSET,
    };
    Some(jdn_to_ymd(days + offset + JDN_1900_EPOCH))
}

/// Format a serial as `YYYY-MM-DD`.
pub fn format_serial_date(serial: f64, system: DateSystem) -> Option<String> {
    serial_to_ymd(serial, system).map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

/// Check whether a number format code renders dates.
///
/// Looks for `d`, `m` or `y` outside quoted literals, bracketed sections
/// (colors, locales, elapsed-time markers) and backslash escapes. A bare `m`
/// next to `#` digit placeholders is not a month, and neither is an `m` run
/// after an hour or before a seconds token, so `h:mm` stays a time.
pub fn is_date_format(format_code: &str) -> bool {
    let lower = format_code.to_lowercase();

    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;
    let mut cleaned = String::new();

    for c in lower.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            _ if !in_quotes && !in_brackets => cleaned.push(c),
            _ => {}
        }
    }

    let cleaned = cleaned.replace("am/pm", "").replace("a/p", "");
    if cleaned.contains('y') || cleaned.contains('d') {
        return true;
    }
    !cleaned.contains('#') && has_month_token(&cleaned)
}

/// True if some `m` run is neither preceded by `h` nor followed by `s`,
/// skipping separators in between.
fn has_month_token(code: &str) -> bool {
    let letters: Vec<char> = code.chars().filter(char::is_ascii_alphabetic).collect();
    let mut i = 0;
    while i < letters.len() {
        if letters.get(i) != Some(&'m') {
            i += 1;
            continue;
        }
        let start = i;
        while letters.get(i) == Some(&'m') {
            i += 1;
        }
        let after_hour = start
            .checked_sub(1)
            .and_then(|p| letters.get(p))
            .is_some_and(|&c| c == 'h');
        let before_seconds = letters.get(i) == Some(&'s');
        if !after_hour && !before_seconds {
            return true;
        }
    }
    false
}

/// Convert Julian Day Number to (year, month, day) in proleptic Gregorian calendar
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn jdn_to_ymd(jdn: i64) -> (i32, u32, u32) {
    // Richards' algorithm for the Gregorian calendar
    let y = 4716;
    let j = 1401;
    let m = 2;
    let n = 12;
    let r = 4;
    let p = 1461;
    let v = 3;
    let u = 5;
    let s = 153;
    let w = 2;
    let b = 274_277;
    let c = -38;

    let f = jdn + j + (((4 * jdn + b) / 146_097) * 3) / 4 + c;
    let e = r * f + v;
    let g = (e % p) / r;
    let h = u * g + w;

    let day = (h % s) / u + 1;
    let month = ((h / s + m) % n) + 1;
    let year = (e / p) - y + (n + m - month) / n;

    (year as i32, month as u32, day as u32)
}
