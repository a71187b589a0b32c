//! CIM datetime literals
//!
//! Timestamps: `yyyymmddhhmmss.mmmmmmsutc` (`s` is `+` or `-`, `utc` is the
//! offset in minutes). Intervals: `ddddddddhhmmss.mmmmmm:000`.
//! Any digit may be `*` to mark an insignificant field.

use std::fmt;

const LEN: usize = 25;

/// A validated 25-character CIM datetime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CimDateTime {
    text: String,
}

impl CimDateTime {
    /// Validate a datetime literal
    pub fn parse(text: &str) -> Result<Self, String> {
        let bytes = text.as_bytes();
        if bytes.len() != LEN {
            return Err(format!("expected {} characters, found {}", LEN, bytes.len()));
        }
        if bytes[14] != b'.' {
            return Err("expected '.' at position 15".to_string());
        }
        let digit_like = |range: std::ops::Range<usize>| {
            bytes[range].iter().all(|b| b.is_ascii_digit() || *b == b'*')
        };
        if !digit_like(0..14) || !digit_like(15..21) || !digit_like(22..25) {
            return Err("expected digits or '*'".to_string());
        }
        let value = CimDateTime {
            text: text.to_string(),
        };
        match bytes[21] {
            b':' => {
                if &bytes[22..25] != b"000" {
                    return Err("interval must end in ':000'".to_string());
                }
                check_range(value.field(8, 10), 0, 23, "hours")?;
            }
            b'+' | b'-' => {
                check_range(value.field(4, 6), 1, 12, "month")?;
                check_range(value.field(6, 8), 1, 31, "day")?;
                check_range(value.field(8, 10), 0, 23, "hours")?;
            }
            _ => return Err("expected '+', '-' or ':' at position 22".to_string()),
        }
        check_range(value.field(10, 12), 0, 59, "minutes")?;
        check_range(value.field(12, 14), 0, 60, "seconds")?;
        Ok(value)
    }

    /// Build a timestamp
    #[allow(clippy::too_many_arguments)]
    pub fn timestamp(
        year: u32,
        month: u32,
        day: u32,
        hours: u32,
        minutes: u32,
        seconds: u32,
        microseconds: u32,
        utc_offset_minutes: i32,
    ) -> Result<Self, String> {
        let sign = if utc_offset_minutes < 0 { '-' } else { '+' };
        Self::parse(&format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}.{:06}{}{:03}",
            year,
            month,
            day,
            hours,
            minutes,
            seconds,
            microseconds,
            sign,
            utc_offset_minutes.unsigned_abs()
        ))
    }

    /// Build an interval
    pub fn interval(
        days: u32,
        hours: u32,
        minutes: u32,
        seconds: u32,
        microseconds: u32,
    ) -> Result<Self, String> {
        Self::parse(&format!(
            "{:08}{:02}{:02}{:02}.{:06}:000",
            days, hours, minutes, seconds, microseconds
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_interval(&self) -> bool {
        self.text.as_bytes()[21] == b':'
    }

    /// Numeric value of `text[start..end]`, `None` if wildcarded
    fn field(&self, start: usize, end: usize) -> Option<u32> {
        self.text[start..end].parse().ok()
    }

    fn timestamp_field(&self, start: usize, end: usize) -> Option<u32> {
        if self.is_interval() {
            None
        } else {
            self.field(start, end)
        }
    }

    pub fn year(&self) -> Option<u32> {
        self.timestamp_field(0, 4)
    }

    pub fn month(&self) -> Option<u32> {
        self.timestamp_field(4, 6)
    }

    pub fn day(&self) -> Option<u32> {
        self.timestamp_field(6, 8)
    }

    /// Day count of an interval
    pub fn days(&self) -> Option<u32> {
        if self.is_interval() {
            self.field(0, 8)
        } else {
            None
        }
    }

    pub fn hours(&self) -> Option<u32> {
        self.field(8, 10)
    }

    pub fn minutes(&self) -> Option<u32> {
        self.field(10, 12)
    }

    pub fn seconds(&self) -> Option<u32> {
        self.field(12, 14)
    }

    pub fn microseconds(&self) -> Option<u32> {
        self.field(15, 21)
    }

    /// UTC offset in minutes of a timestamp
    pub fn utc_offset(&self) -> Option<i32> {
        if self.is_interval() {
            return None;
        }
        let magnitude: i32 = self.text[22..25].parse().ok()?;
        Some(if self.text.as_bytes()[21] == b'-' { -magnitude } else { magnitude })
    }
}

fn check_range(value: Option<u32>, min: u32, max: u32, name: &str) -> Result<(), String> {
    match value {
        Some(v) if v < min || v > max => Err(format!("{} {} out of range {}..={}", name, v, min, max)),
        _ => Ok(()),
    }
}

impl fmt::Display for CimDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl std::str::FromStr for CimDateTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
