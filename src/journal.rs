use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::{self, MonthView};
use crate::cycle::{self, PhaseInfo};
use crate::insights::{generate_insights, Insight};
use crate::models::{
    CyclePrediction, FlowIntensity, Period, Symptom, SymptomType, TrackerSettings, SEVERITY_MAX,
    SEVERITY_MIN,
};
use crate::patterns::{symptom_phase_patterns, SymptomInsight};
use crate::prediction::{predict, PredictorOptions};
use crate::share::{self, PartnerSummary};

/// Contract violations rejected at the journal boundary. The analytical
/// modules below this layer never error; they must only ever see records
/// that already passed these checks.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("severity {0} is outside the 1-5 range")]
    SeverityOutOfRange(u8),
    #[error("period end {end} is before its start {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("{date} falls outside the period it would annotate")]
    DayOutsidePeriod { date: NaiveDate },
    #[error("no period with id {0}")]
    UnknownPeriod(Uuid),
    #[error("journal (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// In-memory record store plus the query facade over the analytical modules.
/// The journal owns record consistency; persistence is the vault's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub periods: Vec<Period>,
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub settings: TrackerSettings,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a period as starting on `date`. Logging the same start twice is
    /// idempotent and returns the existing record's id.
    pub fn start_period(&mut self, date: NaiveDate) -> Uuid {
        if let Some(existing) = self
            .periods
            .iter()
            .find(|p| p.is_active() && p.start_date == date)
        {
            return existing.id;
        }
        let period = Period::new(date);
        let id = period.id;
        self.periods.push(period);
        id
    }

    /// Set or correct a period's end date, dropping per-day flow overrides
    /// that fall outside the shortened span.
    pub fn set_period_end(&mut self, id: Uuid, end: NaiveDate) -> Result<(), JournalError> {
        let period = self.period_mut(id)?;
        if end < period.start_date {
            return Err(JournalError::EndBeforeStart {
                start: period.start_date,
                end,
            });
        }
        period.end_date = Some(end);
        period.flow_by_day.retain(|&day, _| day <= end);
        Ok(())
    }

    pub fn set_period_flow(
        &mut self,
        id: Uuid,
        flow: Option<FlowIntensity>,
    ) -> Result<(), JournalError> {
        self.period_mut(id)?.flow = flow;
        Ok(())
    }

    /// Override the flow for one day inside the period's span.
    pub fn set_flow_for_day(
        &mut self,
        id: Uuid,
        date: NaiveDate,
        flow: FlowIntensity,
    ) -> Result<(), JournalError> {
        let period = self.period_mut(id)?;
        if !period.contains(date) {
            return Err(JournalError::DayOutsidePeriod { date });
        }
        period.flow_by_day.insert(date, flow);
        Ok(())
    }

    /// Soft delete: the record stays in the journal but leaves every active
    /// query until restored.
    pub fn delete_period(&mut self, id: Uuid) -> Result<(), JournalError> {
        self.period_mut(id)?.deleted_at = Some(Utc::now());
        Ok(())
    }

    pub fn restore_period(&mut self, id: Uuid) -> Result<(), JournalError> {
        self.period_mut(id)?.deleted_at = None;
        Ok(())
    }

    fn period_mut(&mut self, id: Uuid) -> Result<&mut Period, JournalError> {
        self.periods
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(JournalError::UnknownPeriod(id))
    }

    pub fn active_periods(&self) -> Vec<&Period> {
        self.periods.iter().filter(|p| p.is_active()).collect()
    }

    pub fn last_period(&self) -> Option<&Period> {
        self.periods
            .iter()
            .filter(|p| p.is_active())
            .max_by_key(|p| p.start_date)
    }

    /// Record a symptom, replacing any earlier record for the same
    /// (date, kind). Severity outside 1-5 is rejected before anything is
    /// stored.
    pub fn log_symptom(
        &mut self,
        date: NaiveDate,
        kind: SymptomType,
        severity: u8,
    ) -> Result<Uuid, JournalError> {
        if !(SEVERITY_MIN..=SEVERITY_MAX).contains(&severity) {
            return Err(JournalError::SeverityOutOfRange(severity));
        }
        if let Some(existing) = self
            .symptoms
            .iter_mut()
            .find(|s| s.date == date && s.kind == kind)
        {
            existing.severity = severity;
            return Ok(existing.id);
        }
        let symptom = Symptom::new(date, kind, severity);
        let id = symptom.id;
        self.symptoms.push(symptom);
        Ok(id)
    }

    /// Returns whether a record existed.
    pub fn remove_symptom(&mut self, date: NaiveDate, kind: SymptomType) -> bool {
        let before = self.symptoms.len();
        self.symptoms.retain(|s| !(s.date == date && s.kind == kind));
        self.symptoms.len() != before
    }

    pub fn symptoms_on(&self, date: NaiveDate) -> Vec<&Symptom> {
        self.symptoms.iter().filter(|s| s.date == date).collect()
    }

    // Query facade. Each call recomputes from current records; nothing is
    // cached between calls.

    pub fn prediction(&self) -> Option<CyclePrediction> {
        predict(&self.periods, PredictorOptions::from(&self.settings))
    }

    pub fn insights(&self, today: NaiveDate) -> Vec<Insight> {
        let prediction = self.prediction();
        generate_insights(&self.periods, &self.symptoms, prediction.as_ref(), today)
    }

    pub fn symptom_patterns(&self) -> Vec<SymptomInsight> {
        symptom_phase_patterns(&self.periods, &self.symptoms)
    }

    pub fn month_view(&self, year: i32, month: u32) -> Option<MonthView> {
        let prediction = self.prediction();
        calendar::month_view(
            year,
            month,
            &self.periods,
            &self.symptoms,
            prediction.as_ref(),
            self.settings.show_fertile_days,
        )
    }

    pub fn cycle_day(&self, today: NaiveDate) -> Option<i64> {
        self.last_period()
            .map(|p| cycle::cycle_day(p.start_date, today))
    }

    pub fn phase_info(&self, today: NaiveDate) -> Option<&'static PhaseInfo> {
        let day = self.cycle_day(today)?;
        let avg = self.prediction()?.average_cycle_length;
        Some(cycle::phase_info(day, avg))
    }

    pub fn partner_summary(&self, today: NaiveDate) -> PartnerSummary {
        let prediction = self.prediction();
        share::partner_summary(&self.periods, prediction.as_ref(), today, &self.settings)
    }

    // Import/export. The JSON shape is the journal itself, so an export is
    // also a plaintext backup of the vault's contents.

    pub fn export_json(&self) -> Result<String, JournalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and re-check an exported journal. Records that would have been
    /// rejected at logging time are rejected here too, before anything
    /// reaches the statistics.
    pub fn import_json(raw: &str) -> Result<Self, JournalError> {
        let journal: Self = serde_json::from_str(raw)?;
        journal.validate()?;
        Ok(journal)
    }

    fn validate(&self) -> Result<(), JournalError> {
        for s in &self.symptoms {
            if !(SEVERITY_MIN..=SEVERITY_MAX).contains(&s.severity) {
                return Err(JournalError::SeverityOutOfRange(s.severity));
            }
        }
        for p in &self.periods {
            if let Some(end) = p.end_date {
                if end < p.start_date {
                    return Err(JournalError::EndBeforeStart {
                        start: p.start_date,
                        end,
                    });
                }
            }
            if let Some(&date) = p.flow_by_day.keys().find(|&&d| !p.contains(d)) {
                return Err(JournalError::DayOutsidePeriod { date });
            }
        }
        Ok(())
    }
}
