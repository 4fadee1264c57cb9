use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::cycle::{phase_for_day, plausible_cycle_gap};
use crate::models::{Period, Phase, Symptom, SymptomType};

/// Fewest active periods worth analyzing.
const MIN_PERIODS: usize = 3;
/// Fewest symptom records worth analyzing.
const MIN_SYMPTOM_RECORDS: usize = 10;
/// Fewest plausible cycle intervals the tallies must cover.
const MIN_VALID_CYCLES: usize = 3;
/// A phase rate must beat the baseline by this factor to be reported.
const LIFT_THRESHOLD: f64 = 1.5;

/// One over-represented (symptom, phase) pairing, with the sample sizes
/// backing the estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomInsight {
    pub kind: SymptomType,
    pub phase: Phase,
    /// Smoothed chance of the symptom on a day in this phase.
    pub probability: f64,
    /// Smoothed chance of the symptom on any observed day.
    pub baseline: f64,
    pub lift: f64,
    pub phase_days: u32,
    pub occurrences: u32,
    pub observed_days: u32,
    pub cycles_analyzed: u32,
}

/// Which symptoms cluster in which phase, as Beta(1,1)-smoothed rates.
/// The smoothing keeps a symptom seen once in a short phase from reporting
/// near-certainty. Thin histories yield an empty list, never an error.
pub fn symptom_phase_patterns(periods: &[Period], symptoms: &[Symptom]) -> Vec<SymptomInsight> {
    let mut active: Vec<&Period> = periods.iter().filter(|p| p.is_active()).collect();
    if active.len() < MIN_PERIODS || symptoms.len() < MIN_SYMPTOM_RECORDS {
        return Vec::new();
    }
    active.sort_by_key(|p| p.start_date);

    // Consecutive [start, next_start) intervals. Implausible gaps are
    // data-entry noise, not cycles.
    let cycles: Vec<(NaiveDate, i64)> = active
        .windows(2)
        .filter_map(|pair| {
            let len = (pair[1].start_date - pair[0].start_date).num_days();
            plausible_cycle_gap(len).then_some((pair[0].start_date, len))
        })
        .collect();
    if cycles.len() < MIN_VALID_CYCLES {
        return Vec::new();
    }

    // Repeated records for the same (date, kind) collapse to one observation.
    let mut by_date: HashMap<NaiveDate, BTreeSet<SymptomType>> = HashMap::new();
    for s in symptoms {
        by_date.entry(s.date).or_default().insert(s.kind);
    }

    let mut phase_days: BTreeMap<Phase, u32> = BTreeMap::new();
    let mut pair_counts: BTreeMap<(SymptomType, Phase), u32> = BTreeMap::new();
    let mut kind_totals: BTreeMap<SymptomType, u32> = BTreeMap::new();
    let mut observed_days: u32 = 0;

    for &(start, len) in &cycles {
        for offset in 0..len {
            // Classified against this cycle's own length, not the
            // historical average.
            let phase = phase_for_day(offset + 1, len);
            observed_days += 1;
            *phase_days.entry(phase).or_insert(0) += 1;

            if let Some(kinds) = by_date.get(&(start + Duration::days(offset))) {
                for &kind in kinds {
                    *pair_counts.entry((kind, phase)).or_insert(0) += 1;
                    *kind_totals.entry(kind).or_insert(0) += 1;
                }
            }
        }
    }

    let mut insights = Vec::new();
    for (&kind, &total) in &kind_totals {
        let baseline = f64::from(total + 1) / f64::from(observed_days + 2);
        for (&phase, &days) in &phase_days {
            if days == 0 {
                continue;
            }
            // A pairing that never occurred is not a pattern, even when a
            // rare symptom's tiny baseline lets the smoothed rate clear the
            // lift bar.
            let occurrences = match pair_counts.get(&(kind, phase)) {
                Some(&k) => k,
                None => continue,
            };
            let probability = f64::from(occurrences + 1) / f64::from(days + 2);
            let lift = probability / baseline;
            if lift >= LIFT_THRESHOLD {
                insights.push(SymptomInsight {
                    kind,
                    phase,
                    probability,
                    baseline,
                    lift,
                    phase_days: days,
                    occurrences,
                    observed_days,
                    cycles_analyzed: cycles.len() as u32,
                });
            }
        }
    }

    insights.sort_by(|a, b| {
        b.lift
            .partial_cmp(&a.lift)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.kind, a.phase).cmp(&(b.kind, b.phase)))
    });
    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_period(start: &str) -> Period {
        Period::new(date(start))
    }

    fn make_symptom(day: &str, kind: SymptomType) -> Symptom {
        Symptom::new(date(day), kind, 3)
    }

    // Five starts, 28 days apart: four plausible cycle intervals.
    fn regular_periods() -> Vec<Period> {
        ["2025-09-03", "2025-10-01", "2025-10-29", "2025-11-26", "2025-12-24"]
            .iter()
            .map(|s| make_period(s))
            .collect()
    }

    // Cramps on days 20 and 24 (luteal) of each of the four cycles, plus
    // headaches on day 8 (follicular) of the first two.
    fn clustered_symptoms() -> Vec<Symptom> {
        let cramp_days = [
            "2025-09-22", "2025-09-26", "2025-10-20", "2025-10-24",
            "2025-11-17", "2025-11-21", "2025-12-15", "2025-12-19",
        ];
        let mut symptoms: Vec<Symptom> = cramp_days
            .iter()
            .map(|s| make_symptom(s, SymptomType::Cramps))
            .collect();
        symptoms.push(make_symptom("2025-09-10", SymptomType::Headache));
        symptoms.push(make_symptom("2025-10-08", SymptomType::Headache));
        symptoms
    }

    #[test]
    fn too_little_history_yields_nothing() {
        let symptoms = clustered_symptoms();

        let two_periods = vec![make_period("2025-10-01"), make_period("2025-10-29")];
        assert!(symptom_phase_patterns(&two_periods, &symptoms).is_empty());

        let mut nine = symptoms.clone();
        nine.truncate(9);
        assert!(symptom_phase_patterns(&regular_periods(), &nine).is_empty());
    }

    #[test]
    fn three_periods_span_only_two_cycles() {
        let periods = vec![
            make_period("2025-10-01"),
            make_period("2025-10-29"),
            make_period("2025-11-26"),
        ];
        assert!(symptom_phase_patterns(&periods, &clustered_symptoms()).is_empty());
    }

    #[test]
    fn implausible_intervals_do_not_count_as_cycles() {
        // Four periods, but one 75-day hole: only two valid intervals remain.
        let periods = vec![
            make_period("2025-07-18"),
            make_period("2025-10-01"),
            make_period("2025-10-29"),
            make_period("2025-11-26"),
        ];
        assert!(symptom_phase_patterns(&periods, &clustered_symptoms()).is_empty());
    }

    #[test]
    fn clustered_symptoms_are_detected_with_expected_lift() {
        let insights = symptom_phase_patterns(&regular_periods(), &clustered_symptoms());

        // 4 cycles of 28 days: 112 observed days, 52 of them luteal and 16
        // follicular. Headache (2 of 2 in follicular) out-lifts cramps.
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].kind, SymptomType::Headache);
        assert_eq!(insights[0].phase, Phase::Follicular);
        assert!((insights[0].lift - 114.0 / 18.0).abs() < 1e-9);

        let cramps = &insights[1];
        assert_eq!(cramps.kind, SymptomType::Cramps);
        assert_eq!(cramps.phase, Phase::Luteal);
        assert_eq!(cramps.occurrences, 8);
        assert_eq!(cramps.phase_days, 52);
        assert_eq!(cramps.observed_days, 112);
        assert_eq!(cramps.cycles_analyzed, 4);
        assert!((cramps.probability - 9.0 / 54.0).abs() < 1e-9);
        assert!((cramps.baseline - 9.0 / 114.0).abs() < 1e-9);
        assert!((cramps.lift - 114.0 / 54.0).abs() < 1e-9);

        // Headache never occurred in the menstrual phase, yet its smoothed
        // rate there (1/22) clears 1.5x of its tiny baseline (3/114). Such
        // pairings must stay unreported.
        assert!(insights.iter().all(|i| i.occurrences > 0));
    }

    #[test]
    fn uniform_density_reports_no_pattern() {
        // Fatigue every single day of the first cycle: the same density in
        // every phase, so no lift clears the threshold.
        let start = date("2025-09-03");
        let symptoms: Vec<Symptom> = (0..28)
            .map(|d| Symptom::new(start + Duration::days(d), SymptomType::Fatigue, 2))
            .collect();

        assert!(symptom_phase_patterns(&regular_periods(), &symptoms).is_empty());
    }

    #[test]
    fn soft_deleted_periods_do_not_feed_the_analysis() {
        let mut periods = regular_periods();
        periods[0].deleted_at = Some(chrono::Utc::now());
        periods[1].deleted_at = Some(chrono::Utc::now());

        assert!(symptom_phase_patterns(&periods, &clustered_symptoms()).is_empty());
    }

    #[test]
    fn duplicate_records_on_a_day_count_once() {
        let mut symptoms = clustered_symptoms();
        symptoms.push(make_symptom("2025-09-22", SymptomType::Cramps));

        let insights = symptom_phase_patterns(&regular_periods(), &symptoms);
        let cramps = insights
            .iter()
            .find(|i| i.kind == SymptomType::Cramps)
            .unwrap();
        assert_eq!(cramps.occurrences, 8);
    }
}
