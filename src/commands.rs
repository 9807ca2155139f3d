use anyhow::{bail, Context, Result};
use tracing::warn;

use cykel_engine::crypto::Passphrase;
use cykel_engine::storage::{default_journal_path, EncryptedFileStore, JournalStore};
use cykel_engine::{
    CalendarDay, Clock, Engine, EngineConfig, FixedClock, Snapshot, SystemClock, Toggle,
};

use crate::cli::{Cli, Command};

/// Unlocked journal plus the engine built from it.
struct Session {
    store: EncryptedFileStore,
    engine: Engine,
}

impl Session {
    fn open(cli: &Cli, config: &EngineConfig) -> Result<Self> {
        let passphrase = cli
            .passphrase
            .clone()
            .context("a passphrase is required (--passphrase or CYKEL_PASSPHRASE)")?;
        let path = match &config.storage.path {
            Some(path) => path.clone(),
            None => default_journal_path()?,
        };
        let store = EncryptedFileStore::new(path, Passphrase::new(passphrase), config.storage.kdf);

        let clock: Box<dyn Clock> = match cli.today {
            Some(today) => Box::new(FixedClock(today)),
            None => Box::new(SystemClock),
        };
        let engine = Engine::from_config(config, clock);
        Ok(Self { store, engine })
    }

    fn unlock(&mut self) -> Result<()> {
        if !self.store.exists()? {
            bail!(
                "no journal at {}, run `cykel init` first",
                self.store.path().display()
            );
        }
        let data = self
            .store
            .load()
            .context("could not unlock journal")?;
        self.engine.restore(data);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let data = self.engine.to_journal();
        self.store.save(&data).context("could not save journal")
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::load(&cli.config)
        .with_context(|| format!("invalid config {}", cli.config.display()))?;
    let mut session = Session::open(&cli, &config)?;

    match cli.command {
        Command::Init => init(&mut session),
        Command::Wipe { yes } => wipe(&mut session, yes),
        Command::Toggle { date } => {
            session.unlock()?;
            toggle(&mut session, date)
        }
        Command::Symptom { date, symptom } => {
            session.unlock()?;
            let now = session.engine.toggle_symptom(date, symptom);
            session.save()?;
            let names: Vec<&str> = now.iter().map(|s| s.name()).collect();
            println!("Updated symptoms for {}: {}", long_date(date), list_or_none(&names));
            Ok(())
        }
        Command::Status => {
            session.unlock()?;
            print_status(&session.engine.snapshot());
            Ok(())
        }
        Command::History => {
            session.unlock()?;
            print_history(&session.engine.snapshot());
            Ok(())
        }
        Command::Month { year, month } => {
            session.unlock()?;
            let view = session.engine.month_view(year, month)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
        Command::Export => {
            session.unlock()?;
            let data = session.engine.to_journal();
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
    }
}

fn init(session: &mut Session) -> Result<()> {
    if session.store.exists()? {
        bail!("a journal already exists at {}", session.store.path().display());
    }
    session.save()?;
    println!("Created journal at {}", session.store.path().display());
    Ok(())
}

fn wipe(session: &mut Session, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to wipe without --yes");
    }
    session.store.wipe()?;
    println!("Journal deleted.");
    Ok(())
}

fn toggle(session: &mut Session, date: CalendarDay) -> Result<()> {
    check_not_future(date, session.engine.snapshot().today)?;

    let outcome = session.engine.toggle_day(date);
    session.save()?;
    match outcome {
        Toggle::Added => println!("Added {} to your period days.", long_date(date)),
        Toggle::Removed => println!("Removed {} from your period days.", long_date(date)),
    }
    Ok(())
}

/// Period days can only be logged for today or earlier.
fn check_not_future(date: CalendarDay, today: CalendarDay) -> Result<()> {
    if date > today {
        warn!(%date, %today, "rejected future date");
        bail!("cannot select future dates: you can only track periods for past and current dates");
    }
    Ok(())
}

fn print_status(snapshot: &Snapshot) {
    let phase = &snapshot.phase;
    let Some(current) = phase.current_phase else {
        println!("Track your period to see predictions and phase information.");
        return;
    };

    println!("Current Phase: {current}");
    println!("  {}", current.description());
    println!("Last period:   {}", short_or(phase.last_period_start, "Not set"));
    println!("Ovulation:     {}", short_or(phase.ovulation_date, "Calculating..."));
    println!("Luteal phase:  {}", short_or(phase.luteal_phase_start, "Calculating..."));
    println!("Next period:   {}", short_or(phase.next_period_prediction, "Calculating..."));

    let stats = &snapshot.stats;
    println!("Cycles logged: {}", stats.total_cycles);
    if let Some(avg) = stats.avg_cycle_length {
        println!("Average cycle: {avg:.1} days");
    }
    if let Some(avg) = stats.avg_period_length {
        println!("Average period: {avg:.1} days");
    }
}

fn print_history(snapshot: &Snapshot) {
    if snapshot.cycles.is_empty() {
        println!(
            "No period history available yet. Start tracking your periods to see your history."
        );
        return;
    }
    for cycle in &snapshot.cycles {
        println!(
            "{} -> {} (Duration: {} days)",
            cycle.start.date().format("%B %-d"),
            long_date(cycle.end),
            cycle.length
        );
    }
}

fn long_date(day: CalendarDay) -> String {
    day.date().format("%B %-d, %Y").to_string()
}

fn short_or(day: Option<CalendarDay>, fallback: &str) -> String {
    day.map(|d| d.date().format("%b %-d").to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn list_or_none(names: &[&str]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> CalendarDay {
        s.parse().unwrap()
    }

    #[test]
    fn today_and_earlier_are_accepted() {
        let today = day("2024-03-10");
        assert!(check_not_future(today, today).is_ok());
        assert!(check_not_future(day("2023-12-31"), today).is_ok());
    }

    #[test]
    fn tomorrow_is_rejected() {
        let today = day("2024-03-10");
        let err = check_not_future(day("2024-03-11"), today).unwrap_err();
        assert!(err.to_string().contains("cannot select future dates"));
    }
}
