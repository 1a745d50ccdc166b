//! Display units and the human-readable formatting used by the renderer.
//!
//! * [`Units`] selects how counts are printed: raw integers, or byte sizes scaled with
//!   binary prefixes (`KiB`, `MiB`, ...).
//! * [`DurationUnit`] names the unit used by
//!   [`ProgressBar::set_max_refresh_rate`](crate::ProgressBar::set_max_refresh_rate).

use std::{str::FromStr, time::Duration};

use compact_str::{CompactString, ToCompactString, format_compact};

use crate::error::Error;

const BYTE_PREFIXES: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// How the current and total counts (and the speed) are displayed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Units {
    /// Plain integers.
    #[default]
    Default,
    /// Byte sizes with binary (1024) prefixes.
    Bytes,
}

impl Units {
    /// Formats a count in these units.
    #[must_use]
    pub fn format(self, value: u64) -> CompactString {
        match self {
            Self::Default => value.to_compact_string(),
            #[allow(clippy::cast_precision_loss)]
            Self::Bytes => format_bytes(value as f64),
        }
    }

    /// Formats a per-second rate in these units, e.g. `12.50/s` or `1.20 MiB/s`.
    #[must_use]
    pub fn format_rate(self, per_sec: f64) -> CompactString {
        match self {
            Self::Default => format_compact!("{per_sec:.2}/s"),
            Self::Bytes => format_compact!("{}/s", format_bytes(per_sec)),
        }
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "count" | "items" => Ok(Self::Default),
            "bytes" | "b" => Ok(Self::Bytes),
            _ => Err(Error::UnknownUnits(s.into())),
        }
    }
}

/// Scales a byte count with binary prefixes.
///
/// Values below 1024 are printed without decimals (`512 B`), larger ones with two
/// (`1.00 MiB`).
fn format_bytes(value: f64) -> CompactString {
    if value < 1024.0 {
        return format_compact!("{value:.0} B");
    }

    let mut scaled = value;
    let mut prefix = 0;
    while scaled >= 1024.0 && prefix < BYTE_PREFIXES.len() - 1 {
        scaled /= 1024.0;
        prefix += 1;
    }

    format_compact!("{scaled:.2} {}", BYTE_PREFIXES[prefix])
}

/// Formats a duration compactly: `7s`, `3m 05s`, `2h 14m`.
#[must_use]
pub fn format_duration(duration: Duration) -> CompactString {
    let secs = duration.as_secs();
    if secs < 60 {
        format_compact!("{secs}s")
    } else if secs < 3600 {
        format_compact!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format_compact!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Unit of the value passed to
/// [`ProgressBar::set_max_refresh_rate`](crate::ProgressBar::set_max_refresh_rate).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DurationUnit {
    /// Nanoseconds.
    Nanos,
    /// Microseconds.
    Micros,
    /// Milliseconds.
    Millis,
    /// Seconds.
    Secs,
}

impl DurationUnit {
    /// Builds a [`Duration`] of `value` units.
    #[must_use]
    pub const fn duration(self, value: u64) -> Duration {
        match self {
            Self::Nanos => Duration::from_nanos(value),
            Self::Micros => Duration::from_micros(value),
            Self::Millis => Duration::from_millis(value),
            Self::Secs => Duration::from_secs(value),
        }
    }
}

impl FromStr for DurationUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ns" | "nanos" | "nanoseconds" => Ok(Self::Nanos),
            "us" | "µs" | "micros" | "microseconds" => Ok(Self::Micros),
            "ms" | "millis" | "milliseconds" => Ok(Self::Millis),
            "s" | "secs" | "seconds" => Ok(Self::Secs),
            _ => Err(Error::UnknownDurationUnit(s.into())),
        }
    }
}
