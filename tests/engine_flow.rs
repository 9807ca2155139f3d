use std::cell::Cell;
use std::rc::Rc;

use cykel_engine::crypto::{KdfParams, Passphrase};
use cykel_engine::{
    CalendarDay, Cycle, CyclePhase, EncryptedFileStore, Engine, EngineConfig, FixedClock,
    JournalStore, MemoryStore, MergeStrategy, PredictionPolicy, Symptom,
};

fn day(s: &str) -> CalendarDay {
    s.parse().unwrap()
}

fn cheap_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

/// Toggle every day in `start..=end`.
fn log_period(engine: &mut Engine, start: CalendarDay, end: CalendarDay) {
    let mut current = start;
    while current <= end {
        engine.toggle_day(current);
        current = current.offset(1).unwrap();
    }
}

fn engine_at(config: &EngineConfig, today: &str) -> Engine {
    Engine::from_config(config, Box::new(FixedClock(day(today))))
}

#[test]
fn three_months_of_logging() {
    let config = EngineConfig::default();
    let mut engine = engine_at(&config, "2024-03-10");

    for (start, end) in [
        ("2024-01-03", "2024-01-06"),
        ("2024-01-31", "2024-02-02"),
        ("2024-02-28", "2024-03-03"),
    ] {
        log_period(&mut engine, day(start), day(end));
    }

    let snap = engine.snapshot();
    assert_eq!(
        snap.cycles,
        vec![
            Cycle::spanning(day("2024-02-28"), day("2024-03-03")),
            Cycle::spanning(day("2024-01-31"), day("2024-02-02")),
            Cycle::spanning(day("2024-01-03"), day("2024-01-06")),
        ]
    );
    assert_eq!(snap.stats.total_cycles, 3);
    assert_eq!(snap.stats.avg_cycle_length, Some(28.0));
    assert_eq!(snap.stats.shortest_cycle, Some(28));
    assert_eq!(snap.stats.avg_period_length, Some(4.0));

    // predictions anchor on the last logged day
    assert_eq!(snap.phase.last_period_start, Some(day("2024-03-03")));
    assert_eq!(snap.phase.ovulation_date, Some(day("2024-03-17")));
    assert_eq!(snap.phase.next_period_prediction, Some(day("2024-03-31")));
    assert_eq!(snap.phase.current_phase, Some(CyclePhase::Follicular));
}

#[test]
fn merge_window_boundary() {
    let config = EngineConfig::default();
    let mut engine = engine_at(&config, "2024-01-20");

    engine.toggle_day(day("2024-01-01"));
    engine.toggle_day(day("2024-01-08"));
    assert_eq!(
        engine.snapshot().cycles,
        vec![Cycle::spanning(day("2024-01-01"), day("2024-01-08"))]
    );

    engine.toggle_day(day("2024-01-08"));
    engine.toggle_day(day("2024-01-09"));
    assert_eq!(engine.snapshot().cycles.len(), 2);
}

#[test]
fn configuration_selects_policy_and_strategy() {
    let config = EngineConfig::from_toml(
        "[cycle]\npolicy = \"chained\"\n[clustering]\nstrategy = \"coalesce\"\n",
    )
    .unwrap();
    assert_eq!(config.policy(), PredictionPolicy::Chained);
    assert_eq!(config.clusterer().strategy, MergeStrategy::Coalesce);

    let mut engine = engine_at(&config, "2024-03-16");
    engine.toggle_day(day("2024-03-01"));
    let phase = engine.snapshot().phase;
    assert_eq!(phase.luteal_phase_start, Some(day("2024-03-16")));
    assert_eq!(phase.current_phase, Some(CyclePhase::Luteal));
}

#[test]
fn journal_survives_encrypted_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.cykel");
    let config = EngineConfig::default();

    let mut engine = engine_at(&config, "2024-05-10");
    engine.toggle_day(day("2024-05-01"));
    engine.toggle_day(day("2024-05-02"));
    engine.toggle_symptom(day("2024-05-01"), Symptom::Cramps);

    let mut store = EncryptedFileStore::new(&path, Passphrase::new("correct horse"), cheap_kdf());
    store.save(&engine.to_journal()).unwrap();

    let reopened = EncryptedFileStore::new(&path, Passphrase::new("correct horse"), cheap_kdf());
    let mut restored = engine_at(&config, "2024-05-10");
    let notified = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notified);
    restored.subscribe(move |_| counter.set(counter.get() + 1));
    restored.restore(reopened.load().unwrap());

    assert_eq!(notified.get(), 1);
    assert_eq!(restored.snapshot().period_days, engine.snapshot().period_days);
    assert_eq!(restored.snapshot().cycles, engine.snapshot().cycles);
    assert_eq!(restored.day_view(day("2024-05-01")).symptoms, vec![Symptom::Cramps]);
}

#[test]
fn memory_store_handoff() {
    let config = EngineConfig::default();
    let mut store = MemoryStore::new();
    let mut engine = engine_at(&config, "2024-05-10");
    engine.toggle_day(day("2024-05-09"));
    store.save(&engine.to_journal()).unwrap();

    let mut other = engine_at(&config, "2024-05-10");
    other.restore(store.load().unwrap());
    assert_eq!(
        other.snapshot().phase.current_phase,
        Some(CyclePhase::Menstrual)
    );
}
