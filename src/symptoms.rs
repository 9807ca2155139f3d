use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::CalendarDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomCategory {
    Physical,
    Mental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Cramps,
    Headache,
    Fatigue,
    Bloating,
    BreastTenderness,
    Backache,
    Nausea,
    Acne,
    Appetite,
    Insomnia,
    MoodSwings,
    Anxiety,
    Depression,
    Irritability,
    Stress,
    Emotional,
    LowEnergy,
    Concentration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown symptom: {0:?}")]
pub struct UnknownSymptom(pub String);

impl Symptom {
    pub const ALL: [Symptom; 18] = [
        Symptom::Cramps,
        Symptom::Headache,
        Symptom::Fatigue,
        Symptom::Bloating,
        Symptom::BreastTenderness,
        Symptom::Backache,
        Symptom::Nausea,
        Symptom::Acne,
        Symptom::Appetite,
        Symptom::Insomnia,
        Symptom::MoodSwings,
        Symptom::Anxiety,
        Symptom::Depression,
        Symptom::Irritability,
        Symptom::Stress,
        Symptom::Emotional,
        Symptom::LowEnergy,
        Symptom::Concentration,
    ];

    /// Stable identifier used in journals and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Symptom::Cramps => "cramps",
            Symptom::Headache => "headache",
            Symptom::Fatigue => "fatigue",
            Symptom::Bloating => "bloating",
            Symptom::BreastTenderness => "breast_tenderness",
            Symptom::Backache => "backache",
            Symptom::Nausea => "nausea",
            Symptom::Acne => "acne",
            Symptom::Appetite => "appetite",
            Symptom::Insomnia => "insomnia",
            Symptom::MoodSwings => "mood_swings",
            Symptom::Anxiety => "anxiety",
            Symptom::Depression => "depression",
            Symptom::Irritability => "irritability",
            Symptom::Stress => "stress",
            Symptom::Emotional => "emotional",
            Symptom::LowEnergy => "low_energy",
            Symptom::Concentration => "concentration",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Symptom::Cramps => "Cramps",
            Symptom::Headache => "Headache",
            Symptom::Fatigue => "Fatigue",
            Symptom::Bloating => "Bloating",
            Symptom::BreastTenderness => "Breast Tenderness",
            Symptom::Backache => "Backache",
            Symptom::Nausea => "Nausea",
            Symptom::Acne => "Acne",
            Symptom::Appetite => "Increased Appetite",
            Symptom::Insomnia => "Insomnia",
            Symptom::MoodSwings => "Mood Swings",
            Symptom::Anxiety => "Anxiety",
            Symptom::Depression => "Depression",
            Symptom::Irritability => "Irritability",
            Symptom::Stress => "Stress",
            Symptom::Emotional => "Emotional",
            Symptom::LowEnergy => "Low Energy",
            Symptom::Concentration => "Poor Concentration",
        }
    }

    pub fn category(self) -> SymptomCategory {
        match self {
            Symptom::MoodSwings
            | Symptom::Anxiety
            | Symptom::Depression
            | Symptom::Irritability
            | Symptom::Stress
            | Symptom::Emotional
            | Symptom::LowEnergy
            | Symptom::Concentration => SymptomCategory::Mental,
            _ => SymptomCategory::Physical,
        }
    }

    pub fn in_category(category: SymptomCategory) -> impl Iterator<Item = Symptom> {
        Self::ALL.into_iter().filter(move |s| s.category() == category)
    }
}

impl FromStr for Symptom {
    type Err = UnknownSymptom;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sym| sym.id() == s)
            .ok_or_else(|| UnknownSymptom(s.to_string()))
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Symptoms recorded per calendar day. Days with nothing recorded are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomLog {
    entries: BTreeMap<CalendarDay, BTreeSet<Symptom>>,
}

impl SymptomLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `symptom` for `day` and return that day's symptoms afterwards.
    pub fn toggle(&mut self, day: CalendarDay, symptom: Symptom) -> Vec<Symptom> {
        let set = self.entries.entry(day).or_default();
        if !set.remove(&symptom) {
            set.insert(symptom);
        }
        let now: Vec<Symptom> = set.iter().copied().collect();
        if now.is_empty() {
            self.entries.remove(&day);
        }
        now
    }

    pub fn for_day(&self, day: CalendarDay) -> Vec<Symptom> {
        self.entries
            .get(&day)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Days within `from..=to` that have at least one symptom.
    pub fn in_range(
        &self,
        from: CalendarDay,
        to: CalendarDay,
    ) -> impl Iterator<Item = (CalendarDay, Vec<Symptom>)> + '_ {
        let range = if from <= to {
            Some(self.entries.range(from..=to))
        } else {
            None
        };
        range
            .into_iter()
            .flatten()
            .map(|(day, set)| (*day, set.iter().copied().collect()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CalendarDay, Vec<Symptom>)> + '_ {
        self.entries
            .iter()
            .map(|(day, set)| (*day, set.iter().copied().collect()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(CalendarDay, Vec<Symptom>)> for SymptomLog {
    fn from_iter<I: IntoIterator<Item = (CalendarDay, Vec<Symptom>)>>(iter: I) -> Self {
        let mut entries: BTreeMap<CalendarDay, BTreeSet<Symptom>> = BTreeMap::new();
        for (day, symptoms) in iter {
            entries.entry(day).or_default().extend(symptoms);
        }
        entries.retain(|_, set| !set.is_empty());
        Self { entries }
    }
}
