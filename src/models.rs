use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::symptoms::Symptom;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// A date with day granularity. Equality and ordering are by calendar date only.
///
/// Serializes as a `YYYY-MM-DD` string so persisted journals never pick up
/// time-of-day or timezone drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDay(NaiveDate);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid date: {input:?} (expected YYYY-MM-DD)")]
pub struct DayParseError {
    pub input: String,
}

impl CalendarDay {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Truncate a timestamp to the calendar day it falls on in its own timezone.
    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self {
        Self(datetime.date_naive())
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// Signed number of days from `earlier` to `self`.
    pub fn days_since(self, earlier: CalendarDay) -> i64 {
        (self.0 - earlier.0).num_days()
    }

    /// Shift by `days`. `None` only when the result leaves chrono's representable range.
    pub fn offset(self, days: i64) -> Option<Self> {
        let delta = chrono::TimeDelta::try_days(days)?;
        self.0.checked_add_signed(delta).map(Self)
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for CalendarDay {
    type Err = DayParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // chrono accepts unpadded fields; the journal format does not
        if trimmed.len() != 10 {
            return Err(DayParseError { input: s.to_string() });
        }
        NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
            .map(Self)
            .map_err(|_| DayParseError { input: s.to_string() })
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

/// One clustered menstrual episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub start: CalendarDay,
    pub end: CalendarDay,
    pub length: i64,
}

impl Cycle {
    pub fn single(day: CalendarDay) -> Self {
        Self {
            start: day,
            end: day,
            length: 1,
        }
    }

    pub fn spanning(start: CalendarDay, end: CalendarDay) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            start,
            end,
            length: end.days_since(start) + 1,
        }
    }

    pub fn contains(&self, day: CalendarDay) -> bool {
        self.start <= day && day <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePhase {
    Menstrual,
    Ovulation,
    Luteal,
    Follicular,
}

impl CyclePhase {
    pub fn label(self) -> &'static str {
        match self {
            CyclePhase::Menstrual => "Menstrual Phase",
            CyclePhase::Ovulation => "Ovulation Phase",
            CyclePhase::Luteal => "Luteal Phase",
            CyclePhase::Follicular => "Follicular Phase",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CyclePhase::Menstrual => {
                "Your period is happening. Take care of yourself with rest and self-care."
            }
            CyclePhase::Ovulation => {
                "You're likely ovulating. Energy levels are typically high during this time."
            }
            CyclePhase::Luteal => {
                "Your body is preparing for the next cycle. You might experience PMS symptoms."
            }
            CyclePhase::Follicular => {
                "Your body is preparing for ovulation. Energy and mood often improve during this time."
            }
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived phase boundaries. Every field is `None` when nothing has been logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseSnapshot {
    pub last_period_start: Option<CalendarDay>,
    pub ovulation_date: Option<CalendarDay>,
    pub luteal_phase_start: Option<CalendarDay>,
    pub next_period_prediction: Option<CalendarDay>,
    pub current_phase: Option<CyclePhase>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CycleStats {
    pub total_cycles: usize,
    pub avg_cycle_length: Option<f32>,
    pub avg_period_length: Option<f32>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub last_period_start: Option<CalendarDay>,
    pub last_period_end: Option<CalendarDay>,
}

/// Immutable view published after every recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub today: CalendarDay,
    pub period_days: Vec<CalendarDay>,
    pub cycles: Vec<Cycle>,
    pub phase: PhaseSnapshot,
    pub stats: CycleStats,
}

/// Period membership and symptoms merged for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayView {
    pub day: CalendarDay,
    pub is_period_day: bool,
    pub symptoms: Vec<Symptom>,
}

/// Data handed to a month calendar grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub period_days: Vec<CalendarDay>,
    pub symptom_days: Vec<DayView>,
    pub ovulation_date: Option<CalendarDay>,
    pub luteal_phase_start: Option<CalendarDay>,
    pub next_period_prediction: Option<CalendarDay>,
}
