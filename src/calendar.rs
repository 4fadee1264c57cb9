use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::{
    CyclePrediction, FlowIntensity, Period, Symptom, SymptomType, DEFAULT_PERIOD_LENGTH,
};

/// First active period whose inclusive span contains `date`. Periods are
/// assumed non-overlapping by convention; if they do overlap, list order wins.
pub fn period_on(date: NaiveDate, periods: &[Period]) -> Option<&Period> {
    periods
        .iter()
        .filter(|p| p.is_active())
        .find(|p| p.contains(date))
}

/// Recorded flow for a day, if the day falls inside an active period.
pub fn flow_on(date: NaiveDate, periods: &[Period]) -> Option<FlowIntensity> {
    period_on(date, periods).and_then(|p| p.flow_on(date))
}

/// Whether `date` lands in any projected period. The prediction's top-level
/// next-period window is kept as a fallback for hand-built predictions that
/// carry no projections.
pub fn is_predicted_period_day(date: NaiveDate, prediction: &CyclePrediction) -> bool {
    if prediction
        .cycles
        .iter()
        .any(|c| date >= c.period_start && date <= c.period_end)
    {
        return true;
    }

    date >= prediction.next_period_start
        && date <= prediction.next_period_start + Duration::days(DEFAULT_PERIOD_LENGTH - 1)
}

/// Whether `date` falls in a fertile window, either the current cycle's
/// (top-level fields) or any projected cycle's.
pub fn is_fertile_day(date: NaiveDate, prediction: &CyclePrediction) -> bool {
    if date >= prediction.fertile_window_start && date <= prediction.fertile_window_end {
        return true;
    }

    prediction
        .cycles
        .iter()
        .any(|c| date >= c.fertile_window_start && date <= c.fertile_window_end)
}

/// Whether `date` is an estimated ovulation day, current cycle or projected.
pub fn is_ovulation_day(date: NaiveDate, prediction: &CyclePrediction) -> bool {
    prediction.ovulation_date == date
        || prediction.cycles.iter().any(|c| c.ovulation_date == date)
}

/// One calendar day, flagged for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub in_period: bool,
    pub flow: Option<FlowIntensity>,
    pub predicted_period: bool,
    pub fertile: bool,
    pub ovulation: bool,
    pub symptoms: Vec<SymptomType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DaySummary>,
}

/// Assemble per-day flags for one calendar month. Fertility marks are opt-in.
/// Returns `None` for an invalid year/month.
pub fn month_view(
    year: i32,
    month: u32,
    periods: &[Period],
    symptoms: &[Symptom],
    prediction: Option<&CyclePrediction>,
    show_fertile: bool,
) -> Option<MonthView> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }? - Duration::days(1);

    let mut days = Vec::with_capacity(31);
    let mut day = first;
    while day <= last {
        let containing = period_on(day, periods);
        let kinds: Vec<SymptomType> = symptoms
            .iter()
            .filter(|s| s.date == day)
            .map(|s| s.kind)
            .collect();

        days.push(DaySummary {
            date: day,
            in_period: containing.is_some(),
            flow: containing.and_then(|p| p.flow_on(day)),
            predicted_period: prediction.map_or(false, |p| is_predicted_period_day(day, p)),
            fertile: show_fertile && prediction.map_or(false, |p| is_fertile_day(day, p)),
            ovulation: show_fertile && prediction.map_or(false, |p| is_ovulation_day(day, p)),
            symptoms: kinds,
        });
        day = day + Duration::days(1);
    }

    Some(MonthView { year, month, days })
}
