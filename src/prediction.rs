use crate::models::{CalendarDay, Cycle, CyclePhase, CycleStats, PhaseSnapshot};

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
/// Ovulation is placed this many days after the anchor.
pub const OVULATION_OFFSET_DAYS: i64 = 14;
/// Length of the luteal phase preceding the next period.
pub const LUTEAL_LENGTH_DAYS: i64 = 14;
/// Menstrual phase covers the anchor day plus this many following days.
pub const MENSTRUAL_WINDOW_DAYS: i64 = 5;
/// Ovulation phase covers the days up to and including the ovulation date.
pub const OVULATION_LEAD_DAYS: i64 = 3;

/// Formula set used to derive phase boundaries from the anchor day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionPolicy {
    /// Next period after `cycle_length` days, luteal phase the last 14 of them.
    Configured { cycle_length: i64 },
    /// Fixed 28-day cycle with the luteal phase starting the day after ovulation.
    Chained,
}

impl Default for PredictionPolicy {
    fn default() -> Self {
        PredictionPolicy::Configured {
            cycle_length: DEFAULT_CYCLE_LENGTH,
        }
    }
}

impl PredictionPolicy {
    pub fn ovulation_date(self, anchor: CalendarDay) -> Option<CalendarDay> {
        anchor.offset(OVULATION_OFFSET_DAYS)
    }

    pub fn luteal_phase_start(self, anchor: CalendarDay) -> Option<CalendarDay> {
        match self {
            PredictionPolicy::Configured { cycle_length } => {
                anchor.offset(cycle_length.checked_sub(LUTEAL_LENGTH_DAYS)?)
            }
            PredictionPolicy::Chained => self.ovulation_date(anchor)?.offset(1),
        }
    }

    pub fn next_period(self, anchor: CalendarDay) -> Option<CalendarDay> {
        match self {
            PredictionPolicy::Configured { cycle_length } => anchor.offset(cycle_length),
            PredictionPolicy::Chained => anchor.offset(DEFAULT_CYCLE_LENGTH),
        }
    }
}

/// Derive phase boundaries from the most recent logged day and classify `today`.
pub fn predict(
    policy: PredictionPolicy,
    anchor: Option<CalendarDay>,
    today: CalendarDay,
) -> PhaseSnapshot {
    let Some(anchor) = anchor else {
        return PhaseSnapshot::default();
    };

    let mut snapshot = PhaseSnapshot {
        last_period_start: Some(anchor),
        ovulation_date: policy.ovulation_date(anchor),
        luteal_phase_start: policy.luteal_phase_start(anchor),
        next_period_prediction: policy.next_period(anchor),
        current_phase: None,
    };
    snapshot.current_phase = classify(&snapshot, today);
    snapshot
}

/// Place `today` in a phase. First matching rule wins; `None` without an anchor.
pub fn classify(snapshot: &PhaseSnapshot, today: CalendarDay) -> Option<CyclePhase> {
    let anchor = snapshot.last_period_start?;

    if (0..=MENSTRUAL_WINDOW_DAYS).contains(&today.days_since(anchor)) {
        return Some(CyclePhase::Menstrual);
    }
    if let Some(ovulation) = snapshot.ovulation_date {
        if (0..=OVULATION_LEAD_DAYS).contains(&ovulation.days_since(today)) {
            return Some(CyclePhase::Ovulation);
        }
    }
    if let Some(luteal) = snapshot.luteal_phase_start {
        if today >= luteal {
            return Some(CyclePhase::Luteal);
        }
    }
    Some(CyclePhase::Follicular)
}

/// Compute cycle statistics for the stats view.
pub fn cycle_stats(cycles: &[Cycle]) -> CycleStats {
    let mut ordered: Vec<&Cycle> = cycles.iter().collect();
    ordered.sort_by_key(|c| c.start);

    let Some(last) = ordered.last() else {
        return CycleStats::default();
    };

    let period_lengths: Vec<f64> = ordered.iter().map(|c| c.length as f64).collect();

    let cycle_lengths: Vec<i64> = ordered
        .windows(2)
        .map(|w| w[1].start.days_since(w[0].start))
        .collect();

    CycleStats {
        total_cycles: ordered.len(),
        avg_cycle_length: if cycle_lengths.is_empty() {
            None
        } else {
            Some(cycle_lengths.iter().sum::<i64>() as f32 / cycle_lengths.len() as f32)
        },
        avg_period_length: Some(mean(&period_lengths) as f32),
        shortest_cycle: cycle_lengths.iter().copied().min(),
        longest_cycle: cycle_lengths.iter().copied().max(),
        last_period_start: Some(last.start),
        last_period_end: Some(last.end),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
