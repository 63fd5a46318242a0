// src/timestamp.rs - Unix epoch to human-readable time conversion

use crate::error::{CutError, TimeError};
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, TimeZone, Utc};
use std::fmt::Write;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Environment variable consulted for the format used by `-d` and `-u`.
pub const TIME_FORMAT_ENV: &str = "BRO_CUT_TIMEFMT";

/// Upper bound on a single converted value.
pub const MAX_FORMATTED_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeZoneMode {
    Local,
    Utc,
}

/// A validated strftime format plus the zone to render in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeConversion {
    format: String,
    zone: TimeZoneMode,
}

impl TimeConversion {
    pub fn new(format: impl Into<String>, zone: TimeZoneMode) -> Result<Self, CutError> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(CutError::InvalidTimeFormat(format));
        }
        Ok(TimeConversion { format, zone })
    }

    /// Format from `BRO_CUT_TIMEFMT` when set and non-empty, otherwise the default.
    pub fn from_env(zone: TimeZoneMode) -> Result<Self, CutError> {
        let format = std::env::var(TIME_FORMAT_ENV)
            .ok()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string());
        Self::new(format, zone)
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn zone(&self) -> TimeZoneMode {
        self.zone
    }

    pub fn convert(&self, field: &str) -> Result<String, TimeError> {
        let secs = parse_epoch(field)?;
        let mut out = String::new();

        let written = match self.zone {
            TimeZoneMode::Utc => {
                let dt = Utc
                    .timestamp_opt(secs, 0)
                    .single()
                    .ok_or(TimeError::OutOfRange(secs))?;
                write!(out, "{}", dt.format(&self.format))
            }
            TimeZoneMode::Local => {
                let dt = Local
                    .timestamp_opt(secs, 0)
                    .earliest()
                    .ok_or(TimeError::OutOfRange(secs))?;
                write!(out, "{}", dt.format(&self.format))
            }
        };
        written.map_err(|_| TimeError::Format(self.format.clone()))?;

        if out.len() > MAX_FORMATTED_LEN {
            return Err(TimeError::TooLong {
                length: out.len(),
                max: MAX_FORMATTED_LEN,
            });
        }
        Ok(out)
    }
}

/// Whole seconds from a Zeek `time` value. A fractional part is accepted
/// (Zeek writes microseconds) and dropped.
pub fn parse_epoch(field: &str) -> Result<i64, TimeError> {
    let (whole, fraction) = match field.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (field, None),
    };

    if let Some(fraction) = fraction {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeError::NotNumeric(field.to_string()));
        }
    }

    whole
        .parse::<i64>()
        .map_err(|_| TimeError::NotNumeric(field.to_string()))
}
