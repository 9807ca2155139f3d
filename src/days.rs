use std::collections::BTreeSet;

use crate::models::CalendarDay;

/// What a toggle did to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Logged period days, unique by calendar date and kept in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateSet {
    days: BTreeSet<CalendarDay>,
}

impl DateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `day` if present, insert it otherwise.
    pub fn toggle(&mut self, day: CalendarDay) -> (Toggle, Vec<CalendarDay>) {
        let outcome = if self.days.remove(&day) {
            Toggle::Removed
        } else {
            self.days.insert(day);
            Toggle::Added
        };
        (outcome, self.as_ordered())
    }

    /// Returns `true` if the day was not already present.
    pub fn insert(&mut self, day: CalendarDay) -> bool {
        self.days.insert(day)
    }

    /// Returns `true` if the day was present.
    pub fn remove(&mut self, day: CalendarDay) -> bool {
        self.days.remove(&day)
    }

    pub fn contains(&self, day: CalendarDay) -> bool {
        self.days.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Chronologically last logged day, the anchor for predictions.
    pub fn last(&self) -> Option<CalendarDay> {
        self.days.last().copied()
    }

    pub fn as_ordered(&self) -> Vec<CalendarDay> {
        self.days.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = CalendarDay> + '_ {
        self.days.iter().copied()
    }

    /// Days within `from..=to`.
    pub fn in_range(&self, from: CalendarDay, to: CalendarDay) -> Vec<CalendarDay> {
        if from > to {
            return Vec::new();
        }
        self.days.range(from..=to).copied().collect()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }
}

impl FromIterator<CalendarDay> for DateSet {
    fn from_iter<I: IntoIterator<Item = CalendarDay>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

impl Extend<CalendarDay> for DateSet {
    fn extend<I: IntoIterator<Item = CalendarDay>>(&mut self, iter: I) {
        self.days.extend(iter);
    }
}
