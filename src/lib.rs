//! Privacy-first cycle tracking core.
//!
//! Pure statistics over period and symptom records: cycle-day and phase
//! arithmetic, next-period prediction, Bayesian symptom-phase patterns and
//! rule-based insights. The [`journal::Journal`] owns the records and fronts
//! the queries; the [`vault`] keeps them encrypted at rest. Nothing here
//! talks to a network.
//!
//! ```
//! use chrono::NaiveDate;
//! use ciclo::journal::Journal;
//!
//! let mut journal = Journal::new();
//! journal.start_period(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
//! journal.start_period(NaiveDate::from_ymd_opt(2026, 1, 29).unwrap());
//!
//! let prediction = journal.prediction().unwrap();
//! assert_eq!(prediction.average_cycle_length, 28);
//! assert_eq!(
//!     prediction.next_period_start,
//!     NaiveDate::from_ymd_opt(2026, 2, 26).unwrap()
//! );
//! ```

pub mod calendar;
pub mod cycle;
pub mod insights;
pub mod journal;
pub mod models;
pub mod patterns;
pub mod prediction;
pub mod share;
pub mod vault;

pub use insights::{generate_insights, Insight, InsightTone};
pub use journal::{Journal, JournalError};
pub use models::{
    Confidence, CyclePrediction, FlowIntensity, Period, Phase, ProjectedCycle, Symptom,
    SymptomType, TrackerSettings,
};
pub use patterns::{symptom_phase_patterns, SymptomInsight};
pub use prediction::{predict, PredictorOptions};
pub use share::{partner_summary, PartnerSummary};
pub use vault::VaultError;
