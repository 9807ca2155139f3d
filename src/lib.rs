//! Cycle inference and phase prediction for the cykel tracker.
//!
//! Logged period days go into an [`Engine`], which clusters them into
//! [`Cycle`]s, derives ovulation, luteal and next-period dates from the most
//! recent logged day, and classifies "today" into a [`CyclePhase`]. Every
//! mutation publishes a fresh immutable [`Snapshot`].

pub mod cluster;
pub mod config;
pub mod crypto;
pub mod days;
pub mod engine;
pub mod models;
pub mod prediction;
pub mod storage;
pub mod symptoms;

pub use cluster::{Clusterer, MergeStrategy};
pub use config::EngineConfig;
pub use days::{DateSet, Toggle};
pub use engine::{Clock, Engine, EngineError, FixedClock, SubscriptionId, SystemClock};
pub use models::{
    CalendarDay, Cycle, CyclePhase, CycleStats, DayParseError, DayView, MonthView,
    PhaseSnapshot, Snapshot,
};
pub use prediction::PredictionPolicy;
pub use storage::{EncryptedFileStore, JournalData, JournalStore, MemoryStore, StorageError};
pub use symptoms::{Symptom, SymptomCategory, SymptomLog};
