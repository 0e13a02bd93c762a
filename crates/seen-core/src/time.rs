//! Minute-precision timestamps and query windows.
//!
//! All timestamps are naive UTC. The canonical text form is
//! `YYYY-MM-DDTHH:MM`: no seconds, no zone. Values that carry an offset are
//! converted to UTC; everything else goes through [`normalize`] and is taken
//! as UTC already. The upstream presence feed sometimes sends
//! `YYYY-MM-DD-HH:MM:SS`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Error, Result};

/// `strftime` pattern of the canonical form.
pub const FORMAT: &str = "%Y-%m-%dT%H:%M";

// ─── Timestamp ───────────────────────────────────────────────────────────────

/// A naive UTC date-time. Values read from the wire carry minute precision;
/// [`Timestamp::now`] keeps seconds so open intervals measure exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
  pub const MIN: Self = Self(NaiveDateTime::MIN);
  pub const MAX: Self = Self(NaiveDateTime::MAX);

  /// The current UTC wall-clock time.
  pub fn now() -> Self { Self(Utc::now().naive_utc()) }

  pub fn from_naive(dt: NaiveDateTime) -> Self { Self(dt) }

  pub fn as_naive(&self) -> NaiveDateTime { self.0 }

  /// Drop seconds and sub-second precision.
  pub fn truncate_to_minute(self) -> Self {
    let dt = self.0;
    Self(dt.with_nanosecond(0).and_then(|d| d.with_second(0)).unwrap_or(dt))
  }

  /// Whole seconds from `self` to `later`, truncated toward zero. Negative if
  /// `later` is earlier.
  pub fn seconds_until(self, later: Timestamp) -> i64 {
    (later.0 - self.0).num_seconds()
  }

  /// Whole days from `self` to `later`.
  pub fn days_until(self, later: Timestamp) -> i64 {
    (later.0 - self.0).num_days()
  }
}

impl fmt::Display for Timestamp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(FORMAT))
  }
}

impl FromStr for Timestamp {
  type Err = Error;

  /// Convert zoned values to UTC, otherwise normalise then parse strictly.
  /// A bare `YYYY-MM-DD` is read as midnight.
  fn from_str(raw: &str) -> Result<Self> {
    if let Some(utc) = parse_zoned(raw.trim()) {
      return Ok(Self(utc).truncate_to_minute());
    }
    let canonical = normalize(raw);
    if let Ok(dt) = NaiveDateTime::parse_from_str(&canonical, FORMAT) {
      return Ok(Self(dt));
    }
    NaiveDate::parse_from_str(&canonical, "%Y-%m-%d")
      .ok()
      .and_then(|d| d.and_hms_opt(0, 0, 0))
      .map(Self)
      .ok_or_else(|| Error::InvalidTimestamp(raw.to_owned()))
  }
}

impl Serialize for Timestamp {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Timestamp {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(de::Error::custom)
  }
}

// ─── Normalisation ───────────────────────────────────────────────────────────

/// RFC 3339, or minute precision with a numeric offset.
fn parse_zoned(raw: &str) -> Option<NaiveDateTime> {
  DateTime::parse_from_rfc3339(raw)
    .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z"))
    .ok()
    .map(|dt| dt.naive_utc())
}

/// Rewrite a loosely-formatted timestamp into the canonical minute form.
///
/// - A space between date and time becomes `T`. Failing both, the third `-`
///   becomes the separator.
/// - Everything from the second `:` on (seconds, fractions, offsets) is
///   dropped, as is a trailing `Z`, `+hh` or `-hh` zone marker.
///
/// The output is not validated; feed it to a strict parser.
pub fn normalize(raw: &str) -> String {
  let raw = raw.trim();
  let has_separator = raw.contains(['T', ' ']);
  let mut out = String::with_capacity(raw.len());
  let mut dashes = 0;
  let mut colons = 0;

  for ch in raw.chars() {
    match ch {
      'Z' | '+' | '-' if colons > 0 => break,
      ' ' => out.push('T'),
      '-' if !has_separator => {
        dashes += 1;
        out.push(if dashes == 3 { 'T' } else { '-' });
      }
      ':' => {
        colons += 1;
        if colons == 2 {
          break;
        }
        out.push(ch);
      }
      _ => out.push(ch),
    }
  }
  out
}

// ─── Window ──────────────────────────────────────────────────────────────────

/// An inclusive `[from, to]` range that intervals are clipped to before they
/// are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub from: Timestamp,
  pub to:   Timestamp,
}

impl Window {
  pub fn new(from: Timestamp, to: Timestamp) -> Result<Self> {
    if from > to {
      return Err(Error::InvalidWindow { from, to });
    }
    Ok(Self { from, to })
  }

  /// Parse both bounds from their text form.
  pub fn parse(from: &str, to: &str) -> Result<Self> {
    Self::new(from.parse()?, to.parse()?)
  }

  /// A window that contains every representable timestamp.
  pub fn unbounded() -> Self {
    Self {
      from: Timestamp::MIN,
      to:   Timestamp::MAX,
    }
  }
}
