use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const MIN_CYCLE_LENGTH: u32 = 20;
pub const MAX_CYCLE_LENGTH: u32 = 40;
pub const DEFAULT_CYCLE_LENGTH: i64 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Menstrual => "Menstrual",
            Phase::Follicular => "Follicular",
            Phase::Ovulation => "Ovulation",
            Phase::Luteal => "Luteal",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cycle_length must be between 20 and 40, got {0}")]
    CycleLength(i64),

    #[error("cycle_length must be a whole number, got {0:?}")]
    CycleLengthFormat(String),

    #[error("Invalid date format (expected YYYY-MM-DD): {0}")]
    Date(String),

    #[error("Invalid request body: {0}")]
    Body(String),
}

/// Reads a form-supplied cycle length. Blank means the default.
pub fn parse_cycle_length(raw: Option<&str>) -> Result<i64, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_CYCLE_LENGTH),
        Some(value) => value
            .parse()
            .map_err(|_| ValidationError::CycleLengthFormat(value.to_string())),
    }
}

/// Validated inputs for one calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleInput {
    pub last_period_start: NaiveDate,
    pub cycle_length: u32,
}

impl CycleInput {
    pub fn new(last_period_start: NaiveDate, cycle_length: i64) -> Result<Self, ValidationError> {
        if !(MIN_CYCLE_LENGTH as i64..=MAX_CYCLE_LENGTH as i64).contains(&cycle_length) {
            return Err(ValidationError::CycleLength(cycle_length));
        }

        Ok(Self {
            last_period_start,
            cycle_length: cycle_length as u32,
        })
    }

    /// Parses the raw request fields. Date-times are accepted and truncated to their date.
    pub fn parse(last_period_start: &str, cycle_length: i64) -> Result<Self, ValidationError> {
        let date = parse_date(last_period_start)?;
        Self::new(date, cycle_length)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.date());
        }
    }

    Err(ValidationError::Date(raw.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleState {
    pub day_of_cycle: u32,
    pub phase: Phase,
    pub days_until_next: u32,
    pub upcoming_phase: Phase,
}

#[derive(Debug, Deserialize)]
pub struct CycleRequest {
    pub last_period_start: String,
    #[serde(default = "default_cycle_length")]
    pub cycle_length: i64,
}

fn default_cycle_length() -> i64 {
    DEFAULT_CYCLE_LENGTH
}

impl CycleRequest {
    pub fn validate(&self) -> Result<CycleInput, ValidationError> {
        CycleInput::parse(&self.last_period_start, self.cycle_length)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub day_of_cycle: u32,
    pub phase: Phase,
    pub advice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub day_of_cycle: u32,
    pub phase: Phase,
    pub advice: String,
    pub days_until_next: u32,
    pub upcoming_phase: Phase,
    pub prep_tips: Option<String>,
}
