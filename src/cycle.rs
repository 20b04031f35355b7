//! Cycle day and phase arithmetic.
//!
//! Boundaries are fixed at days 13/14/15 regardless of cycle length.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{CycleInput, CycleState, Phase};

pub const PERIOD_LENGTH: u32 = 5;

const FOLLICULAR_LAST_DAY: u32 = 13;
const OVULATION_DAY: u32 = 14;
const LUTEAL_FIRST_DAY: u32 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("no phase boundary after day {day} in a {cycle_length}-day cycle")]
    NoBoundary { day: u32, cycle_length: u32 },
}

pub fn phase_of_day(day: u32, cycle_length: u32, period_length: u32) -> Phase {
    debug_assert!((1..=cycle_length).contains(&day));

    if day <= period_length {
        Phase::Menstrual
    } else if day <= FOLLICULAR_LAST_DAY {
        Phase::Follicular
    } else if day == OVULATION_DAY {
        Phase::Ovulation
    } else {
        Phase::Luteal
    }
}

/// 1-based day of the cycle `today` falls on. Never returns 0.
pub fn day_of_cycle(reference: NaiveDate, today: NaiveDate, cycle_length: u32) -> u32 {
    let elapsed = (today - reference).num_days();
    match elapsed.rem_euclid(cycle_length as i64) {
        0 => cycle_length,
        day => day as u32,
    }
}

pub fn days_until_next_phase(
    day: u32,
    cycle_length: u32,
    period_length: u32,
) -> Result<u32, CycleError> {
    let boundaries = [
        period_length + 1,
        OVULATION_DAY,
        LUTEAL_FIRST_DAY,
        cycle_length + 1,
    ];

    boundaries
        .into_iter()
        .find(|&boundary| day < boundary)
        .map(|boundary| boundary - day)
        .ok_or(CycleError::NoBoundary { day, cycle_length })
}

pub fn upcoming_phase(day: u32, cycle_length: u32, period_length: u32) -> Result<Phase, CycleError> {
    let d = days_until_next_phase(day, cycle_length, period_length)?;
    let next_day = (day + d - 1) % cycle_length + 1;
    Ok(phase_of_day(next_day, cycle_length, period_length))
}

impl CycleState {
    pub fn compute(input: &CycleInput, today: NaiveDate) -> Result<Self, CycleError> {
        let cycle_length = input.cycle_length;
        let day = day_of_cycle(input.last_period_start, today, cycle_length);

        Ok(Self {
            day_of_cycle: day,
            phase: phase_of_day(day, cycle_length, PERIOD_LENGTH),
            days_until_next: days_until_next_phase(day, cycle_length, PERIOD_LENGTH)?,
            upcoming_phase: upcoming_phase(day, cycle_length, PERIOD_LENGTH)?,
        })
    }
}
