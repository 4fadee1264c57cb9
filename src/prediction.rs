use chrono::Duration;

use crate::cycle::{self, FERTILE_WINDOW_LEAD, FERTILE_WINDOW_TRAIL};
use crate::models::{
    Confidence, CyclePrediction, Period, ProjectedCycle, TrackerSettings, DEFAULT_PERIOD_LENGTH,
};

/// Cycle length assumed until enough history exists to measure one.
pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
/// Upper bound on future cycles a prediction will project.
pub const MAX_PROJECTED_CYCLES: u32 = 5;

/// How many recent start-to-start gaps feed the average.
const RECENT_GAPS_USED: usize = 3;
/// Period counts behind the confidence tiers. A count heuristic, not a
/// statistical confidence interval.
const MEDIUM_CONFIDENCE_PERIODS: usize = 3;
const HIGH_CONFIDENCE_PERIODS: usize = 6;

/// Knobs for `predict`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorOptions {
    /// Future cycles to project; used clamped to 1-5.
    pub months_ahead: u32,
    /// Assumed bleeding length for projected periods, in days.
    pub period_length: i64,
}

impl Default for PredictorOptions {
    fn default() -> Self {
        Self {
            months_ahead: 3,
            period_length: DEFAULT_PERIOD_LENGTH,
        }
    }
}

impl From<&TrackerSettings> for PredictorOptions {
    fn from(settings: &TrackerSettings) -> Self {
        Self {
            months_ahead: settings.prediction_months,
            period_length: i64::from(settings.assumed_period_length),
        }
    }
}

/// Project the cycle forward from recorded history.
///
/// Returns `None` only when no active periods exist. A single period still
/// yields a prediction, on the 28-day default and `Low` confidence. Input
/// order never matters; soft-deleted periods never count.
pub fn predict(periods: &[Period], options: PredictorOptions) -> Option<CyclePrediction> {
    let mut active: Vec<&Period> = periods.iter().filter(|p| p.is_active()).collect();
    if active.is_empty() {
        return None;
    }

    active.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    let gaps: Vec<f64> = active
        .windows(2)
        .take(RECENT_GAPS_USED)
        .map(|w| (w[0].start_date - w[1].start_date).num_days())
        .filter(|&d| cycle::plausible_cycle_gap(d))
        .map(|d| d as f64)
        .collect();

    let average_cycle_length = if gaps.is_empty() {
        DEFAULT_CYCLE_LENGTH
    } else {
        mean(&gaps).round() as i64
    };

    let confidence = if active.len() >= HIGH_CONFIDENCE_PERIODS {
        Confidence::High
    } else if active.len() >= MEDIUM_CONFIDENCE_PERIODS {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    let last_start = active[0].start_date;
    let ovulation_offset = cycle::ovulation_day(average_cycle_length);

    // The top-level dates describe the cycle currently underway.
    let ovulation_date = last_start + Duration::days(ovulation_offset);
    let next_period_start = last_start + Duration::days(average_cycle_length);

    let months = options.months_ahead.clamp(1, MAX_PROJECTED_CYCLES);
    let period_span = options.period_length.max(1) - 1;

    let cycles = (1..=i64::from(months))
        .map(|i| {
            let period_start = last_start + Duration::days(i * average_cycle_length);
            let ovulation = period_start + Duration::days(ovulation_offset);
            ProjectedCycle {
                period_start,
                period_end: period_start + Duration::days(period_span),
                ovulation_date: ovulation,
                fertile_window_start: ovulation - Duration::days(FERTILE_WINDOW_LEAD),
                fertile_window_end: ovulation + Duration::days(FERTILE_WINDOW_TRAIL),
            }
        })
        .collect();

    Some(CyclePrediction {
        next_period_start,
        ovulation_date,
        fertile_window_start: ovulation_date - Duration::days(FERTILE_WINDOW_LEAD),
        fertile_window_end: ovulation_date + Duration::days(FERTILE_WINDOW_TRAIL),
        confidence,
        average_cycle_length,
        cycles,
    })
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
