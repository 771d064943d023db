//! Time points and half-open time bounds.
//!
//! A `Time` is either absolute (nanoseconds since the Unix epoch) or relative
//! (a signed nanosecond offset from "now"). Bounds are `[start, stop)`.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
pub const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Time {
    Absolute(i64),
    Relative(i64),
}

impl Time {
    pub const fn absolute(ns: i64) -> Self {
        Time::Absolute(ns)
    }

    pub const fn relative(offset_ns: i64) -> Self {
        Time::Relative(offset_ns)
    }

    /// Resolve to an absolute timestamp given the planning-time `now`.
    pub fn resolve(self, now: i64) -> i64 {
        match self {
            Time::Absolute(t) => t,
            Time::Relative(offset) => now.saturating_add(offset),
        }
    }

    /// Later of two points. Same-kind points compare directly; mixed kinds
    /// are resolved against `now` and the result is absolute.
    pub fn later(self, other: Time, now: i64) -> Time {
        match (self, other) {
            (Time::Absolute(a), Time::Absolute(b)) => Time::Absolute(a.max(b)),
            (Time::Relative(a), Time::Relative(b)) => Time::Relative(a.max(b)),
            (a, b) => Time::Absolute(a.resolve(now).max(b.resolve(now))),
        }
    }

    /// Earlier of two points (see [`Time::later`]).
    pub fn earlier(self, other: Time, now: i64) -> Time {
        match (self, other) {
            (Time::Absolute(a), Time::Absolute(b)) => Time::Absolute(a.min(b)),
            (Time::Relative(a), Time::Relative(b)) => Time::Relative(a.min(b)),
            (a, b) => Time::Absolute(a.resolve(now).min(b.resolve(now))),
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Time::Absolute(t) => write!(f, "{t}"),
            Time::Relative(0) => write!(f, "now"),
            Time::Relative(offset) => write!(f, "now{offset:+}ns"),
        }
    }
}

/// Half-open interval `[start, stop)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub start: Time,
    pub stop: Time,
}

impl Bounds {
    pub fn new(start: Time, stop: Time) -> Self {
        Self { start, stop }
    }

    /// Convenience constructor for absolute nanosecond bounds.
    pub fn absolute(start: i64, stop: i64) -> Self {
        Self::new(Time::Absolute(start), Time::Absolute(stop))
    }

    /// `[max(start), min(stop))`. The result may be empty; reading an empty
    /// window is legal and simply returns nothing.
    pub fn intersect(&self, other: &Bounds, now: i64) -> Bounds {
        Bounds {
            start: self.start.later(other.start, now),
            stop: self.stop.earlier(other.stop, now),
        }
    }

    pub fn is_empty(&self, now: i64) -> bool {
        self.start.resolve(now) >= self.stop.resolve(now)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}

/// Parse a signed duration literal such as `-4h`, `30m`, `1h30m`, `500ms`.
pub fn parse_duration(src: &str) -> Option<i64> {
    let s = src.trim();
    let (negative, mut rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if rest.is_empty() {
        return None;
    }

    let mut total: i64 = 0;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let magnitude: i64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SECOND,
            "m" => NANOS_PER_MINUTE,
            "h" => NANOS_PER_HOUR,
            "d" => 24 * NANOS_PER_HOUR,
            "w" => 7 * 24 * NANOS_PER_HOUR,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total = total.checked_add(magnitude.checked_mul(unit)?)?;
    }

    Some(if negative { -total } else { total })
}
