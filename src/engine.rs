use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::cluster::Clusterer;
use crate::config::EngineConfig;
use crate::days::{DateSet, Toggle};
use crate::models::{CalendarDay, DayView, MonthView, Snapshot};
use crate::prediction::{self, PredictionPolicy};
use crate::storage::JournalData;
use crate::symptoms::{Symptom, SymptomLog};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid month: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
}

/// Source of "today" for phase classification.
pub trait Clock {
    fn today(&self) -> CalendarDay;
}

/// Today's date in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> CalendarDay {
        CalendarDay::from_datetime(&chrono::Local::now())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub CalendarDay);

impl Clock for FixedClock {
    fn today(&self) -> CalendarDay {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

type Subscriber = Box<dyn FnMut(&Arc<Snapshot>)>;

/// Owns the logged days and keeps a freshly computed [`Snapshot`] after every change.
pub struct Engine {
    days: DateSet,
    symptoms: SymptomLog,
    clusterer: Clusterer,
    policy: PredictionPolicy,
    clock: Box<dyn Clock>,
    snapshot: Arc<Snapshot>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl Engine {
    pub fn new(clusterer: Clusterer, policy: PredictionPolicy, clock: Box<dyn Clock>) -> Self {
        let today = clock.today();
        let mut engine = Self {
            days: DateSet::new(),
            symptoms: SymptomLog::new(),
            clusterer,
            policy,
            clock,
            snapshot: Arc::new(Snapshot {
                today,
                period_days: Vec::new(),
                cycles: Vec::new(),
                phase: Default::default(),
                stats: Default::default(),
            }),
            subscribers: Vec::new(),
        };
        engine.recompute();
        engine
    }

    pub fn from_config(config: &EngineConfig, clock: Box<dyn Clock>) -> Self {
        Self::new(config.clusterer(), config.policy(), clock)
    }

    /// Latest published snapshot.
    ///
    /// `today` and the current phase are fixed at the last recompute. A
    /// long-lived engine should call [`Engine::refresh`] to pick up a new day.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Recompute only if the clock has moved to a different day since the
    /// last snapshot.
    pub fn refresh(&mut self) -> Arc<Snapshot> {
        if self.clock.today() != self.snapshot.today {
            return self.recompute();
        }
        self.snapshot()
    }

    pub fn policy(&self) -> PredictionPolicy {
        self.policy
    }

    pub fn days(&self) -> &DateSet {
        &self.days
    }

    pub fn symptoms(&self) -> &SymptomLog {
        &self.symptoms
    }

    /// Add `day` if it is not logged, remove it if it is.
    pub fn toggle_day(&mut self, day: CalendarDay) -> Toggle {
        let (outcome, _) = self.days.toggle(day);
        debug!(%day, ?outcome, "toggled period day");
        self.recompute();
        outcome
    }

    pub fn add_day(&mut self, day: CalendarDay) -> bool {
        let added = self.days.insert(day);
        if added {
            self.recompute();
        }
        added
    }

    pub fn remove_day(&mut self, day: CalendarDay) -> bool {
        let removed = self.days.remove(day);
        if removed {
            self.recompute();
        }
        removed
    }

    pub fn replace_days<I: IntoIterator<Item = CalendarDay>>(&mut self, days: I) {
        self.days = days.into_iter().collect();
        self.recompute();
    }

    /// Swap in a fixed "today" and reclassify.
    pub fn set_today(&mut self, today: CalendarDay) {
        self.clock = Box::new(FixedClock(today));
        self.recompute();
    }

    /// Rebuild cycles and predictions from scratch and notify subscribers.
    pub fn recompute(&mut self) -> Arc<Snapshot> {
        let today = self.clock.today();
        let period_days = self.days.as_ordered();
        let cycles = self.clusterer.cluster(&period_days);
        let phase = prediction::predict(self.policy, self.days.last(), today);
        let stats = prediction::cycle_stats(&cycles);

        debug!(
            %today,
            period_days = period_days.len(),
            cycles = cycles.len(),
            phase = ?phase.current_phase,
            "recomputed snapshot"
        );

        let snapshot = Arc::new(Snapshot {
            today,
            period_days,
            cycles,
            phase,
            stats,
        });
        self.snapshot = Arc::clone(&snapshot);

        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&snapshot);
        }
        snapshot
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&Arc<Snapshot>) + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Symptoms do not feed clustering, so no recompute happens here.
    pub fn toggle_symptom(&mut self, day: CalendarDay, symptom: Symptom) -> Vec<Symptom> {
        self.symptoms.toggle(day, symptom)
    }

    pub fn day_view(&self, day: CalendarDay) -> DayView {
        DayView {
            day,
            is_period_day: self.days.contains(day),
            symptoms: self.symptoms.for_day(day),
        }
    }

    pub fn month_view(&self, year: i32, month: u32) -> Result<MonthView, EngineError> {
        let invalid = EngineError::InvalidMonth { year, month };
        let first_day = CalendarDay::from_ymd(year, month, 1).ok_or_else(|| invalid.clone())?;
        let last_day = if month == 12 {
            CalendarDay::from_ymd(year + 1, 1, 1)
        } else {
            CalendarDay::from_ymd(year, month + 1, 1)
        }
        .and_then(|next| next.offset(-1))
        .ok_or(invalid)?;

        let in_month = |d: Option<CalendarDay>| d.filter(|d| first_day <= *d && *d <= last_day);
        let phase = &self.snapshot.phase;

        Ok(MonthView {
            year,
            month,
            period_days: self.days.in_range(first_day, last_day),
            symptom_days: self
                .symptoms
                .in_range(first_day, last_day)
                .map(|(day, symptoms)| DayView {
                    day,
                    is_period_day: self.days.contains(day),
                    symptoms,
                })
                .collect(),
            ovulation_date: in_month(phase.ovulation_date),
            luteal_phase_start: in_month(phase.luteal_phase_start),
            next_period_prediction: in_month(phase.next_period_prediction),
        })
    }

    /// Load a persisted journal, replacing everything in memory.
    pub fn restore(&mut self, data: JournalData) {
        self.symptoms = data.symptoms.into_iter().collect();
        self.days = data.period_days.into_iter().collect();
        self.recompute();
    }

    pub fn to_journal(&self) -> JournalData {
        JournalData {
            period_days: self.days.as_ordered(),
            symptoms: self.symptoms.iter().collect(),
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("days", &self.days.len())
            .field("clusterer", &self.clusterer)
            .field("policy", &self.policy)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cycle, CyclePhase};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn day(s: &str) -> CalendarDay {
        s.parse().unwrap()
    }

    fn engine_at(today: &str) -> Engine {
        Engine::new(
            Clusterer::default(),
            PredictionPolicy::default(),
            Box::new(FixedClock(day(today))),
        )
    }

    #[test]
    fn fresh_engine_has_empty_snapshot() {
        let engine = engine_at("2024-03-10");
        let snap = engine.snapshot();
        assert!(snap.period_days.is_empty());
        assert!(snap.cycles.is_empty());
        assert_eq!(snap.phase.current_phase, None);
        assert_eq!(snap.today, day("2024-03-10"));
    }

    #[test]
    fn toggle_recomputes_everything() {
        let mut engine = engine_at("2024-03-03");
        assert_eq!(engine.toggle_day(day("2024-03-01")), Toggle::Added);
        engine.toggle_day(day("2024-03-02"));

        let snap = engine.snapshot();
        assert_eq!(snap.period_days, vec![day("2024-03-01"), day("2024-03-02")]);
        assert_eq!(
            snap.cycles,
            vec![Cycle::spanning(day("2024-03-01"), day("2024-03-02"))]
        );
        // anchor is the last logged day, not the cycle start
        assert_eq!(snap.phase.last_period_start, Some(day("2024-03-02")));
        assert_eq!(snap.phase.next_period_prediction, Some(day("2024-03-30")));
        assert_eq!(snap.phase.current_phase, Some(CyclePhase::Menstrual));

        assert_eq!(engine.toggle_day(day("2024-03-02")), Toggle::Removed);
        assert_eq!(
            engine.snapshot().phase.last_period_start,
            Some(day("2024-03-01"))
        );
    }

    #[test]
    fn removing_last_day_clears_predictions() {
        let mut engine = engine_at("2024-03-03");
        engine.toggle_day(day("2024-03-01"));
        engine.toggle_day(day("2024-03-01"));
        let snap = engine.snapshot();
        assert!(snap.cycles.is_empty());
        assert_eq!(snap.phase, Default::default());
    }

    #[test]
    fn older_snapshots_stay_untouched() {
        let mut engine = engine_at("2024-03-03");
        let before = engine.snapshot();
        engine.toggle_day(day("2024-03-01"));
        assert!(before.period_days.is_empty());
        assert_eq!(engine.snapshot().period_days.len(), 1);
    }

    #[test]
    fn subscribers_see_every_mutation() {
        let mut engine = engine_at("2024-03-03");
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let id = engine.subscribe(move |snap| sink.borrow_mut().push(snap.period_days.len()));

        engine.toggle_day(day("2024-03-01"));
        engine.add_day(day("2024-03-02"));
        // already present, nothing changes
        engine.add_day(day("2024-03-02"));
        engine.remove_day(day("2024-03-01"));
        assert_eq!(*seen.borrow(), vec![1, 2, 1]);

        assert!(engine.unsubscribe(id));
        assert!(!engine.unsubscribe(id));
        engine.toggle_day(day("2024-03-05"));
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn set_today_reclassifies() {
        let mut engine = engine_at("2024-03-01");
        engine.toggle_day(day("2024-03-01"));
        assert_eq!(
            engine.snapshot().phase.current_phase,
            Some(CyclePhase::Menstrual)
        );
        engine.set_today(day("2024-03-07"));
        assert_eq!(
            engine.snapshot().phase.current_phase,
            Some(CyclePhase::Follicular)
        );
        engine.set_today(day("2024-03-20"));
        assert_eq!(engine.snapshot().phase.current_phase, Some(CyclePhase::Luteal));
    }

    #[derive(Clone)]
    struct SharedClock(Rc<Cell<CalendarDay>>);

    impl Clock for SharedClock {
        fn today(&self) -> CalendarDay {
            self.0.get()
        }
    }

    #[test]
    fn refresh_picks_up_a_new_day() {
        let clock = SharedClock(Rc::new(Cell::new(day("2024-03-06"))));
        let mut engine = Engine::new(
            Clusterer::default(),
            PredictionPolicy::default(),
            Box::new(clock.clone()),
        );
        engine.toggle_day(day("2024-03-01"));

        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        engine.subscribe(move |_| counter.set(counter.get() + 1));

        // same day, nothing to redo
        engine.refresh();
        assert_eq!(notified.get(), 0);

        clock.0.set(day("2024-03-07"));
        assert_eq!(
            engine.snapshot().phase.current_phase,
            Some(CyclePhase::Menstrual)
        );
        let snap = engine.refresh();
        assert_eq!(snap.today, day("2024-03-07"));
        assert_eq!(snap.phase.current_phase, Some(CyclePhase::Follicular));
        assert_eq!(notified.get(), 1);
    }

    #[test]
    fn chained_policy_through_engine() {
        let mut engine = Engine::new(
            Clusterer::default(),
            PredictionPolicy::Chained,
            Box::new(FixedClock(day("2024-03-15"))),
        );
        engine.toggle_day(day("2024-03-01"));
        let phase = engine.snapshot().phase;
        assert_eq!(phase.luteal_phase_start, Some(day("2024-03-16")));
        assert_eq!(phase.current_phase, Some(CyclePhase::Ovulation));
    }

    #[test]
    fn future_days_are_accepted() {
        let mut engine = engine_at("2024-03-01");
        engine.toggle_day(day("2024-04-01"));
        let snap = engine.snapshot();
        assert_eq!(snap.cycles.len(), 1);
        assert_eq!(snap.phase.current_phase, Some(CyclePhase::Follicular));
    }

    #[test]
    fn day_and_month_views_merge_symptoms() {
        let mut engine = engine_at("2024-02-05");
        engine.toggle_day(day("2024-02-01"));
        engine.toggle_symptom(day("2024-02-01"), Symptom::Cramps);
        engine.toggle_symptom(day("2024-02-20"), Symptom::Anxiety);
        engine.toggle_symptom(day("2024-03-01"), Symptom::Acne);

        let view = engine.day_view(day("2024-02-01"));
        assert!(view.is_period_day);
        assert_eq!(view.symptoms, vec![Symptom::Cramps]);

        let feb = engine.month_view(2024, 2).unwrap();
        assert_eq!(feb.period_days, vec![day("2024-02-01")]);
        assert_eq!(feb.symptom_days.len(), 2);
        assert_eq!(feb.ovulation_date, Some(day("2024-02-15")));
        assert_eq!(feb.next_period_prediction, Some(day("2024-02-29")));

        let mar = engine.month_view(2024, 3).unwrap();
        assert_eq!(mar.next_period_prediction, None);
        assert_eq!(mar.symptom_days[0].day, day("2024-03-01"));
    }

    #[test]
    fn december_month_view() {
        let mut engine = engine_at("2024-12-31");
        engine.toggle_day(day("2024-12-31"));
        let dec = engine.month_view(2024, 12).unwrap();
        assert_eq!(dec.period_days, vec![day("2024-12-31")]);
    }

    #[test]
    fn invalid_month_is_an_error() {
        let engine = engine_at("2024-03-01");
        assert_eq!(
            engine.month_view(2024, 13),
            Err(EngineError::InvalidMonth {
                year: 2024,
                month: 13
            })
        );
    }

    #[test]
    fn journal_round_trip_preserves_state() {
        let mut engine = engine_at("2024-03-03");
        engine.toggle_day(day("2024-03-01"));
        engine.toggle_symptom(day("2024-03-01"), Symptom::Headache);
        let journal = engine.to_journal();

        let mut restored = engine_at("2024-03-03");
        restored.restore(journal.clone());
        assert_eq!(restored.to_journal(), journal);
        assert_eq!(*restored.snapshot(), *engine.snapshot());
    }
}
