use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::{CalendarDay, Cycle};

/// Days logged within this many days of an existing cycle boundary join that cycle.
pub const DEFAULT_MERGE_WINDOW_DAYS: i64 = 7;

/// How a day that sits inside the merge window of more than one cycle is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Extend the first matching cycle and leave the others untouched.
    #[default]
    FirstMatch,
    /// Extend the first match, then fuse any cycles that now sit within the
    /// merge window of one another.
    Coalesce,
}

/// Groups logged period days into cycles by proximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clusterer {
    pub merge_window_days: i64,
    pub strategy: MergeStrategy,
}

impl Default for Clusterer {
    fn default() -> Self {
        Self {
            merge_window_days: DEFAULT_MERGE_WINDOW_DAYS,
            strategy: MergeStrategy::FirstMatch,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: CalendarDay,
    end: CalendarDay,
}

impl Span {
    fn absorb(&mut self, start: CalendarDay, end: CalendarDay) {
        self.start = self.start.min(start);
        self.end = self.end.max(end);
    }

    /// Days of empty calendar between two spans; negative when they overlap.
    fn gap(&self, other: &Span) -> i64 {
        other
            .start
            .days_since(self.end)
            .max(self.start.days_since(other.end))
    }
}

impl Clusterer {
    pub fn new(merge_window_days: i64, strategy: MergeStrategy) -> Self {
        Self {
            merge_window_days,
            strategy,
        }
    }

    /// Cluster `days` into cycles, most recent first.
    ///
    /// Days are processed in the order given. With the ascending input a
    /// [`DateSet`](crate::days::DateSet) produces, no day can ever match two
    /// cycles and both strategies agree.
    pub fn cluster(&self, days: &[CalendarDay]) -> Vec<Cycle> {
        let mut spans: Vec<Span> = Vec::new();

        for &day in days {
            match spans.iter_mut().find(|s| self.within_window(s, day)) {
                Some(span) => span.absorb(day, day),
                None => spans.push(Span {
                    start: day,
                    end: day,
                }),
            }

            if self.strategy == MergeStrategy::Coalesce {
                self.coalesce(&mut spans);
            }
        }

        let mut cycles: Vec<Cycle> = spans
            .iter()
            .map(|s| Cycle::spanning(s.start, s.end))
            .collect();
        cycles.sort_by(|a, b| b.start.cmp(&a.start));

        trace!(days = days.len(), cycles = cycles.len(), "clustered period days");
        cycles
    }

    fn within_window(&self, span: &Span, day: CalendarDay) -> bool {
        span.start.days_since(day).abs() <= self.merge_window_days
            || span.end.days_since(day).abs() <= self.merge_window_days
    }

    fn coalesce(&self, spans: &mut Vec<Span>) {
        'rescan: loop {
            for i in 0..spans.len() {
                for j in (i + 1)..spans.len() {
                    if spans[i].gap(&spans[j]) <= self.merge_window_days {
                        let other = spans.remove(j);
                        spans[i].absorb(other.start, other.end);
                        continue 'rescan;
                    }
                }
            }
            break;
        }
    }
}

/// Cluster with the default window and first-match resolution.
pub fn cluster(days: &[CalendarDay]) -> Vec<Cycle> {
    Clusterer::default().cluster(days)
}
