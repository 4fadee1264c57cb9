use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days an open-ended period is assumed to span.
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;

/// Valid severity range for a symptom record.
pub const SEVERITY_MIN: u8 = 1;
pub const SEVERITY_MAX: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowIntensity {
    Spotting,
    Light,
    Medium,
    Heavy,
}

impl FlowIntensity {
    pub fn label(&self) -> &'static str {
        match self {
            FlowIntensity::Spotting => "Spotting",
            FlowIntensity::Light => "Light",
            FlowIntensity::Medium => "Medium",
            FlowIntensity::Heavy => "Heavy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomType {
    Cramps,
    Headache,
    MoodSwings,
    Fatigue,
    Bloating,
    BreastTenderness,
    Acne,
    Nausea,
    Backache,
    Insomnia,
    FoodCravings,
    Dizziness,
}

impl SymptomType {
    pub const ALL: [SymptomType; 12] = [
        SymptomType::Cramps,
        SymptomType::Headache,
        SymptomType::MoodSwings,
        SymptomType::Fatigue,
        SymptomType::Bloating,
        SymptomType::BreastTenderness,
        SymptomType::Acne,
        SymptomType::Nausea,
        SymptomType::Backache,
        SymptomType::Insomnia,
        SymptomType::FoodCravings,
        SymptomType::Dizziness,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SymptomType::Cramps => "Cramps",
            SymptomType::Headache => "Headache",
            SymptomType::MoodSwings => "Mood swings",
            SymptomType::Fatigue => "Fatigue",
            SymptomType::Bloating => "Bloating",
            SymptomType::BreastTenderness => "Breast tenderness",
            SymptomType::Acne => "Acne",
            SymptomType::Nausea => "Nausea",
            SymptomType::Backache => "Backache",
            SymptomType::Insomnia => "Insomnia",
            SymptomType::FoodCravings => "Food cravings",
            SymptomType::Dizziness => "Dizziness",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SymptomType::Cramps => "⚡",
            SymptomType::Headache => "🤕",
            SymptomType::MoodSwings => "🎭",
            SymptomType::Fatigue => "😴",
            SymptomType::Bloating => "🎈",
            SymptomType::BreastTenderness => "💗",
            SymptomType::Acne => "🔴",
            SymptomType::Nausea => "🤢",
            SymptomType::Backache => "🦴",
            SymptomType::Insomnia => "🌙",
            SymptomType::FoodCravings => "🍫",
            SymptomType::Dizziness => "💫",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Menstrual,
        Phase::Follicular,
        Phase::Ovulation,
        Phase::Luteal,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// One menstrual period. `start_date` is the identity/sorting anchor;
/// a missing `end_date` means the period is ongoing or its end was never logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow: Option<FlowIntensity>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flow_by_day: BTreeMap<NaiveDate, FlowIntensity>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Period {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_date,
            end_date: None,
            flow: None,
            flow_by_day: BTreeMap::new(),
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Inclusive last day. An open-ended period spans `DEFAULT_PERIOD_LENGTH`
    /// days from its start; a display policy, not recorded truth.
    pub fn span_end(&self) -> NaiveDate {
        self.end_date
            .unwrap_or(self.start_date + Duration::days(DEFAULT_PERIOD_LENGTH - 1))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.span_end()
    }

    /// Flow for a day: per-day override first, then the period default.
    pub fn flow_on(&self, date: NaiveDate) -> Option<FlowIntensity> {
        self.flow_by_day.get(&date).copied().or(self.flow)
    }
}

/// One (date, kind, severity) observation. Severity is 1-5; the journal
/// rejects anything outside that range before it reaches the analyzers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub id: Uuid,
    pub date: NaiveDate,
    pub kind: SymptomType,
    pub severity: u8,
}

impl Symptom {
    pub fn new(date: NaiveDate, kind: SymptomType, severity: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            kind,
            severity,
        }
    }
}

/// Computed snapshot of where the cycle is heading. Regenerated from period
/// history on every call, never cached or mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyclePrediction {
    pub next_period_start: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
    pub confidence: Confidence,
    pub average_cycle_length: i64,
    pub cycles: Vec<ProjectedCycle>,
}

/// One projected future cycle. Its ovulation/fertile window offsets are
/// relative to this cycle's own start, not to the last recorded period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCycle {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
}

/// Caller-owned knobs. Everything has a sensible default; prediction months
/// are clamped to 1-5 wherever they are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub prediction_months: u32,
    pub assumed_period_length: u32,
    pub show_fertile_days: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            prediction_months: 3,
            assumed_period_length: 5,
            show_fertile_days: false,
        }
    }
}
