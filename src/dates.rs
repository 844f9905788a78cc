//! Expiry-date pipeline: masking, parsing, validation, and status
//! classification for product dates in `DD-MM-YY` form.
//!
//! All functions here are pure and synchronous; the UI applies `mask` on
//! every keystroke in a date field and `validate` before submitting, and
//! the product table derives its status column from `expiry_status`.

use chrono::NaiveDate;

/// Products whose sell-by date is at most this many days away are
/// classified as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 2;

/// Mask raw input into `DD-MM-YY` form.
///
/// Strips all non-digit characters, keeps at most 6 digits, and inserts
/// `-` separators after the 2nd and 4th digit as they become available.
/// Idempotent: `mask(mask(s)) == mask(s)`.
pub fn mask(raw: &str) -> String {
  let mut out = String::with_capacity(8);
  let mut digits = 0;

  for c in raw.chars() {
    if !c.is_ascii_digit() {
      continue;
    }
    if digits == 6 {
      break;
    }
    if digits == 2 || digits == 4 {
      out.push('-');
    }
    out.push(c);
    digits += 1;
  }

  out
}

/// Parse a masked `DD-MM-YY` string into a calendar date.
///
/// Returns `None` for the empty string (no date entered) and for
/// anything that is not exactly `DD-MM-YY`. The year is interpreted as
/// `2000 + YY`. Calendar overflow is rejected: `31-02-26` matches the
/// pattern but names no real date, so it parses as `None`.
pub fn parse(masked: &str) -> Option<NaiveDate> {
  let b = masked.as_bytes();
  if b.len() != 8 || b[2] != b'-' || b[5] != b'-' {
    return None;
  }

  let num = |hi: u8, lo: u8| -> Option<u32> {
    if hi.is_ascii_digit() && lo.is_ascii_digit() {
      Some(u32::from(hi - b'0') * 10 + u32::from(lo - b'0'))
    } else {
      None
    }
  };

  let day = num(b[0], b[1])?;
  let month = num(b[3], b[4])?;
  let year = 2000 + num(b[6], b[7])? as i32;

  NaiveDate::from_ymd_opt(year, month, day)
}

/// Validate a masked date string for form submission.
///
/// Empty input is valid (no date entered). Returns `None` when valid,
/// otherwise an error message suitable for inline display.
pub fn validate(masked: &str) -> Option<String> {
  if masked.is_empty() || parse(masked).is_some() {
    None
  } else {
    Some("Invalid date: expected DD-MM-YY, e.g. 24-12-26".to_string())
  }
}

/// Display status derived from a product's sell-by date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
  /// No parseable sell-by date, or the date is comfortably in the future.
  Ok,
  /// Sell-by date is today or within [`EXPIRING_SOON_DAYS`] days.
  ExpiringSoon(i64),
  /// Sell-by date has passed.
  Expired,
}

impl ExpiryStatus {
  /// Short label for the product table's status column.
  pub fn label(&self) -> String {
    match self {
      ExpiryStatus::Ok => String::new(),
      ExpiryStatus::ExpiringSoon(days) => format!("expires in {}d", days),
      ExpiryStatus::Expired => "expired".to_string(),
    }
  }
}

/// Classify a sell-by date relative to `today`.
///
/// Both sides are calendar dates; callers pass `Utc::now().date_naive()`
/// so time-of-day never influences the classification.
pub fn expiry_status(sell_by: Option<NaiveDate>, today: NaiveDate) -> ExpiryStatus {
  let sell_by = match sell_by {
    Some(date) => date,
    None => return ExpiryStatus::Ok,
  };

  let days_until = (sell_by - today).num_days();
  if days_until < 0 {
    ExpiryStatus::Expired
  } else if days_until <= EXPIRING_SOON_DAYS {
    ExpiryStatus::ExpiringSoon(days_until)
  } else {
    ExpiryStatus::Ok
  }
}

/// Sanitize an auto-update interval before writing it to the server.
///
/// The remote API rejects non-integer or non-positive intervals, so the
/// value is truncated toward zero; non-finite or non-positive input
/// falls back to `fallback`.
pub fn normalize_interval_minutes(value: f64, fallback: u32) -> u32 {
  if !value.is_finite() || value <= 0.0 {
    return fallback;
  }
  let truncated = value.trunc();
  if truncated < 1.0 {
    fallback
  } else {
    truncated as u32
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn test_mask_basic() {
    assert_eq!(mask("0101260"), "01-01-26");
    assert_eq!(mask("01"), "01");
    assert_eq!(mask(""), "");
    assert_eq!(mask("010"), "01-0");
    assert_eq!(mask("0101"), "01-01");
  }

  #[test]
  fn test_mask_strips_non_digits() {
    assert_eq!(mask("01/01/26"), "01-01-26");
    assert_eq!(mask("a1b2c3"), "12-3");
    assert_eq!(mask("--"), "");
  }

  #[test]
  fn test_mask_idempotent() {
    for s in ["", "0", "01", "010", "0101260", "31-12-26", "1/2/34", "abc12de3"] {
      assert_eq!(mask(&mask(s)), mask(s), "mask not idempotent for {:?}", s);
    }
  }

  #[test]
  fn test_parse_valid() {
    assert_eq!(parse("01-01-26"), Some(date(2026, 1, 1)));
    assert_eq!(parse("29-02-24"), Some(date(2024, 2, 29)));
    assert_eq!(parse("31-12-99"), Some(date(2099, 12, 31)));
  }

  #[test]
  fn test_parse_rejects_calendar_overflow() {
    assert_eq!(parse("31-02-26"), None);
    assert_eq!(parse("29-02-26"), None); // 2026 is not a leap year
    assert_eq!(parse("00-01-26"), None);
    assert_eq!(parse("01-13-26"), None);
  }

  #[test]
  fn test_parse_rejects_bad_shape() {
    assert_eq!(parse(""), None);
    assert_eq!(parse("1-1-26"), None);
    assert_eq!(parse("01-01-2026"), None);
    assert_eq!(parse("01012026"), None);
    assert_eq!(parse("aa-bb-cc"), None);
  }

  #[test]
  fn test_validate_empty_is_ok() {
    assert_eq!(validate(""), None);
  }

  #[test]
  fn test_validate_parseable_is_ok() {
    assert_eq!(validate("01-01-26"), None);
  }

  #[test]
  fn test_validate_wrong_grouping() {
    let err = validate("1-1-26").expect("expected an error");
    assert!(err.contains("DD-MM-YY"));
  }

  #[test]
  fn test_validate_overflow() {
    assert!(validate("31-02-26").is_some());
  }

  #[test]
  fn test_expiry_status_classification() {
    let today = date(2026, 6, 15);

    assert_eq!(expiry_status(None, today), ExpiryStatus::Ok);
    assert_eq!(
      expiry_status(Some(date(2026, 6, 14)), today),
      ExpiryStatus::Expired
    );
    assert_eq!(
      expiry_status(Some(date(2026, 6, 15)), today),
      ExpiryStatus::ExpiringSoon(0)
    );
    assert_eq!(
      expiry_status(Some(date(2026, 6, 16)), today),
      ExpiryStatus::ExpiringSoon(1)
    );
    assert_eq!(
      expiry_status(Some(date(2026, 6, 17)), today),
      ExpiryStatus::ExpiringSoon(2)
    );
    assert_eq!(expiry_status(Some(date(2026, 6, 25)), today), ExpiryStatus::Ok);
  }

  #[test]
  fn test_expiry_label_contains_days() {
    assert!(ExpiryStatus::ExpiringSoon(1).label().contains('1'));
    assert_eq!(ExpiryStatus::Expired.label(), "expired");
    assert_eq!(ExpiryStatus::Ok.label(), "");
  }

  #[test]
  fn test_normalize_interval_minutes() {
    assert_eq!(normalize_interval_minutes(0.0, 60), 60);
    assert_eq!(normalize_interval_minutes(15.9, 60), 15);
    assert_eq!(normalize_interval_minutes(-5.0, 60), 60);
    assert_eq!(normalize_interval_minutes(1.0, 60), 1);
    assert_eq!(normalize_interval_minutes(f64::NAN, 60), 60);
    assert_eq!(normalize_interval_minutes(f64::INFINITY, 60), 60);
    assert_eq!(normalize_interval_minutes(0.9, 60), 60);
  }
}
