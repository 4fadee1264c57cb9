use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cycle::{self, phase_catalog};
use crate::models::{Confidence, CyclePrediction, Period, Phase, TrackerSettings};

/// The phase part of a partner summary, with the partner-facing tip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSnapshot {
    pub phase: Phase,
    pub label: String,
    pub partner_tip: String,
}

/// A projected cycle with the fertility dates stripped unless sharing them
/// is switched on. Ovulation counts as fertility data here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingCycle {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ovulation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fertile_window_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fertile_window_end: Option<NaiveDate>,
}

/// Everything a partner gets to see. Symptom and flow records stay out by
/// construction; fertility dates are included only when sharing them is
/// switched on in the settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerSummary {
    pub generated_on: NaiveDate,
    pub cycle_day: Option<i64>,
    pub phase: Option<PhaseSnapshot>,
    pub next_period_start: Option<NaiveDate>,
    /// Negative once the predicted date has passed.
    pub days_until_next_period: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fertile_window_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fertile_window_end: Option<NaiveDate>,
    pub confidence: Option<Confidence>,
    pub upcoming: Vec<UpcomingCycle>,
}

impl PartnerSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Build the redacted snapshot a partner app receives.
pub fn partner_summary(
    periods: &[Period],
    prediction: Option<&CyclePrediction>,
    today: NaiveDate,
    settings: &TrackerSettings,
) -> PartnerSummary {
    let last_start = periods
        .iter()
        .filter(|p| p.is_active())
        .map(|p| p.start_date)
        .max();

    let cycle_day = last_start.map(|start| cycle::cycle_day(start, today));
    let phase = match (cycle_day, prediction) {
        (Some(day), Some(pred)) => {
            let info = phase_catalog(cycle::phase_for_day(day, pred.average_cycle_length));
            Some(PhaseSnapshot {
                phase: info.phase,
                label: info.label.to_string(),
                partner_tip: info.partner_tip.to_string(),
            })
        }
        _ => None,
    };

    let share_fertility = settings.show_fertile_days;
    let (fertile_window_start, fertile_window_end) = if share_fertility {
        (
            prediction.map(|p| p.fertile_window_start),
            prediction.map(|p| p.fertile_window_end),
        )
    } else {
        (None, None)
    };

    let upcoming = prediction
        .map(|p| {
            p.cycles
                .iter()
                .map(|c| UpcomingCycle {
                    period_start: c.period_start,
                    period_end: c.period_end,
                    ovulation_date: share_fertility.then_some(c.ovulation_date),
                    fertile_window_start: share_fertility.then_some(c.fertile_window_start),
                    fertile_window_end: share_fertility.then_some(c.fertile_window_end),
                })
                .collect()
        })
        .unwrap_or_default();

    PartnerSummary {
        generated_on: today,
        cycle_day,
        phase,
        next_period_start: prediction.map(|p| p.next_period_start),
        days_until_next_period: prediction.map(|p| (p.next_period_start - today).num_days()),
        fertile_window_start,
        fertile_window_end,
        confidence: prediction.map(|p| p.confidence),
        upcoming,
    }
}
