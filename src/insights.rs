use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::cycle::{cycle_day, phase_catalog, phase_for_day, plausible_cycle_gap};
use crate::models::{CyclePrediction, Period, Phase, Symptom, SymptomType};
use crate::prediction::std_deviation;

/// At most this many insights per call; rule order is the ranking.
const MAX_INSIGHTS: usize = 3;
/// Cycle-length spread (days) at or under which cycles count as regular.
const REGULAR_STD_DEV_DAYS: f64 = 2.0;
/// Spread above which cycles count as irregular. Between the two, silence.
const IRREGULAR_STD_DEV_DAYS: f64 = 5.0;
/// How many recent intervals feed the regularity measure.
const REGULARITY_GAPS_USED: usize = 6;
/// How many recent periods the pre-period rule looks behind.
const PRE_PERIOD_LOOKBACK: usize = 6;
/// A symptom must show up this often before period starts to be a pattern.
const PRE_PERIOD_MIN_RECURRENCE: u32 = 2;
/// Streak scan window and the streak length worth celebrating.
const STREAK_SCAN_DAYS: i64 = 60;
const STREAK_TARGET_DAYS: i64 = 7;
/// Severity-trend rule gate and the mean shift it reacts to.
const SEVERITY_TREND_MIN_RECORDS: usize = 10;
const SEVERITY_SHIFT: f64 = 0.5;
/// How many logged periods unlock cycle statistics. The engagement nudge
/// counts toward the same bar the regularity rule requires.
const STATS_MIN_PERIODS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightTone {
    Positive,
    Info,
    Warning,
}

/// One human-readable observation, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub id: &'static str,
    pub icon: &'static str,
    pub title: String,
    pub description: String,
    pub tone: InsightTone,
}

/// Evaluate all insight rules in priority order and keep the first three.
/// Rules that lack data stay silent; the result is never an error.
pub fn generate_insights(
    periods: &[Period],
    symptoms: &[Symptom],
    prediction: Option<&CyclePrediction>,
    today: NaiveDate,
) -> Vec<Insight> {
    let active: Vec<&Period> = periods.iter().filter(|p| p.is_active()).collect();

    let mut insights = Vec::new();
    insights.extend(regularity(&active));
    insights.extend(pre_period_pattern(&active, symptoms));
    insights.extend(phase_tip(&active, prediction, today));
    insights.extend(streak(&active, symptoms, today));
    insights.extend(severity_trend(symptoms));
    insights.extend(engagement_nudge(active.len()));
    insights.truncate(MAX_INSIGHTS);
    insights
}

/// Rule 1: spread of recent cycle lengths, as sample standard deviation over
/// up to six plausible intervals. Needs at least two intervals to say
/// anything.
fn regularity(active: &[&Period]) -> Option<Insight> {
    if active.len() < STATS_MIN_PERIODS {
        return None;
    }

    let mut starts: Vec<NaiveDate> = active.iter().map(|p| p.start_date).collect();
    starts.sort_unstable_by(|a, b| b.cmp(a));

    let gaps: Vec<f64> = starts
        .windows(2)
        .take(REGULARITY_GAPS_USED)
        .map(|pair| (pair[0] - pair[1]).num_days())
        .filter(|&days| plausible_cycle_gap(days))
        .map(|days| days as f64)
        .collect();
    if gaps.len() < 2 {
        return None;
    }

    let spread = std_deviation(&gaps);
    if spread <= REGULAR_STD_DEV_DAYS {
        Some(Insight {
            id: "regular-cycles",
            icon: "✅",
            title: "Regular cycles".to_string(),
            description: format!(
                "Your last {} cycles varied by about {:.1} days. Predictions should be reliable.",
                gaps.len() + 1,
                spread
            ),
            tone: InsightTone::Positive,
        })
    } else if spread > IRREGULAR_STD_DEV_DAYS {
        Some(Insight {
            id: "irregular-cycles",
            icon: "⚠️",
            title: "Irregular cycles".to_string(),
            description: format!(
                "Your recent cycle lengths varied by about {spread:.1} days, so predictions \
                 are rough estimates. A clinician can help if this is new for you."
            ),
            tone: InsightTone::Warning,
        })
    } else {
        None
    }
}

/// Rule 2: a symptom type that keeps showing up 1 to 3 days before period
/// starts. Ties resolve in enum order.
fn pre_period_pattern(active: &[&Period], symptoms: &[Symptom]) -> Option<Insight> {
    let mut starts: Vec<NaiveDate> = active.iter().map(|p| p.start_date).collect();
    starts.sort_unstable_by(|a, b| b.cmp(a));
    starts.truncate(PRE_PERIOD_LOOKBACK);

    let mut counts: BTreeMap<SymptomType, u32> = BTreeMap::new();
    for &start in &starts {
        let window = start - Duration::days(3)..=start - Duration::days(1);
        for s in symptoms.iter().filter(|s| window.contains(&s.date)) {
            *counts.entry(s.kind).or_insert(0) += 1;
        }
    }

    let (kind, count) = counts
        .into_iter()
        .max_by_key(|&(kind, count)| (count, std::cmp::Reverse(kind)))?;
    if count < PRE_PERIOD_MIN_RECURRENCE {
        return None;
    }

    Some(Insight {
        id: "pre-period-pattern",
        icon: "🔁",
        title: "Pre-period pattern".to_string(),
        description: format!(
            "{} showed up before your period {count} times recently. Knowing it's coming \
             can make it easier to plan around.",
            kind.label()
        ),
        tone: InsightTone::Info,
    })
}

/// Rule 3: one self-care tip for the phase the user is in right now.
fn phase_tip(
    active: &[&Period],
    prediction: Option<&CyclePrediction>,
    today: NaiveDate,
) -> Option<Insight> {
    let prediction = prediction?;
    let last_start = active.iter().map(|p| p.start_date).max()?;
    let phase = phase_for_day(
        cycle_day(last_start, today),
        prediction.average_cycle_length,
    );

    let tip = match phase {
        Phase::Menstrual => "Rest counts as productivity this week. Iron-rich food and warmth can ease the low-energy days.",
        Phase::Follicular => "Energy usually climbs through this phase. A good window for harder workouts or big plans.",
        Phase::Ovulation => "You're around your most fertile days. Energy and mood often peak here too.",
        Phase::Luteal => "Wind down where you can. Gentle movement and steady sleep tend to soften PMS symptoms.",
    };

    Some(Insight {
        id: "phase-tip",
        icon: "💡",
        title: format!("{} phase", phase_catalog(phase).label),
        description: tip.to_string(),
        tone: InsightTone::Info,
    })
}

/// Rule 4: consecutive days with anything logged, counting back from today.
fn streak(active: &[&Period], symptoms: &[Symptom], today: NaiveDate) -> Option<Insight> {
    let mut logged: HashSet<NaiveDate> = symptoms.iter().map(|s| s.date).collect();
    logged.extend(active.iter().map(|p| p.start_date));

    let mut run = 0i64;
    for back in 0..STREAK_SCAN_DAYS {
        if logged.contains(&(today - Duration::days(back))) {
            run += 1;
        } else {
            break;
        }
    }

    (run >= STREAK_TARGET_DAYS).then(|| Insight {
        id: "streak",
        icon: "🔥",
        title: "Logging streak".to_string(),
        description: format!("{run} days of tracking in a row. The more you log, the sharper your insights get."),
        tone: InsightTone::Positive,
    })
}

/// Rule 5: mean severity of the newer half of records vs the older half.
fn severity_trend(symptoms: &[Symptom]) -> Option<Insight> {
    if symptoms.len() < SEVERITY_TREND_MIN_RECORDS {
        return None;
    }

    let mut ordered: Vec<&Symptom> = symptoms.iter().collect();
    ordered.sort_by_key(|s| s.date);
    let mid = ordered.len() / 2;
    let mean_severity = |slice: &[&Symptom]| {
        slice.iter().map(|s| f64::from(s.severity)).sum::<f64>() / slice.len() as f64
    };
    let shift = mean_severity(&ordered[mid..]) - mean_severity(&ordered[..mid]);

    if shift <= -SEVERITY_SHIFT {
        Some(Insight {
            id: "severity-down",
            icon: "📉",
            title: "Symptoms easing".to_string(),
            description: "Your recent symptoms have been milder than before. Whatever you're doing, it seems to help.".to_string(),
            tone: InsightTone::Positive,
        })
    } else if shift >= SEVERITY_SHIFT {
        Some(Insight {
            id: "severity-up",
            icon: "📈",
            title: "Symptoms intensifying".to_string(),
            description: "Your recent symptoms have been more severe than before. Worth mentioning to a clinician if it continues.".to_string(),
            tone: InsightTone::Warning,
        })
    } else {
        None
    }
}

/// Rule 6: nudge new users toward the record count that unlocks statistics.
fn engagement_nudge(period_count: usize) -> Option<Insight> {
    if period_count == 0 {
        return Some(Insight {
            id: "getting-started",
            icon: "🌱",
            title: "Start tracking".to_string(),
            description: "Log your first period to unlock predictions and cycle insights.".to_string(),
            tone: InsightTone::Info,
        });
    }
    if period_count < STATS_MIN_PERIODS {
        let missing = STATS_MIN_PERIODS - period_count;
        let noun = if missing == 1 { "period" } else { "periods" };
        return Some(Insight {
            id: "more-data",
            icon: "📊",
            title: "Keep logging".to_string(),
            description: format!("Log {missing} more {noun} to unlock cycle statistics and patterns."),
            tone: InsightTone::Info,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::{predict, PredictorOptions};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_period(start: &str) -> Period {
        Period::new(date(start))
    }

    fn periods_28_apart(count: usize) -> Vec<Period> {
        let anchor = date("2025-09-03");
        (0..count)
            .map(|i| Period::new(anchor + Duration::days(28 * i as i64)))
            .collect()
    }

    fn ids(insights: &[Insight]) -> Vec<&'static str> {
        insights.iter().map(|i| i.id).collect()
    }

    #[test]
    fn steady_cycles_read_as_regular() {
        let periods = periods_28_apart(4);
        let insights = generate_insights(&periods, &[], None, date("2025-12-01"));

        assert_eq!(insights[0].id, "regular-cycles");
        assert_eq!(insights[0].tone, InsightTone::Positive);
    }

    #[test]
    fn wide_spread_reads_as_irregular() {
        // Gaps of 28, 35 and 21 days: sample std dev 7.0.
        let periods = vec![
            make_period("2025-09-03"),
            make_period("2025-10-01"),
            make_period("2025-11-05"),
            make_period("2025-11-26"),
        ];
        let insights = generate_insights(&periods, &[], None, date("2025-12-01"));

        assert_eq!(insights[0].id, "irregular-cycles");
        assert_eq!(insights[0].tone, InsightTone::Warning);
    }

    #[test]
    fn middling_spread_stays_silent() {
        // Gaps of 28, 28 and 21 days: sample std dev just over 4.
        let periods = vec![
            make_period("2025-09-10"),
            make_period("2025-10-01"),
            make_period("2025-10-29"),
            make_period("2025-11-26"),
        ];
        let insights = generate_insights(&periods, &[], None, date("2025-12-01"));

        assert!(!ids(&insights).contains(&"regular-cycles"));
        assert!(!ids(&insights).contains(&"irregular-cycles"));
    }

    #[test]
    fn one_plausible_gap_is_not_enough_to_judge_regularity() {
        // The 75-day hole leaves a single valid interval.
        let periods = vec![
            make_period("2025-07-18"),
            make_period("2025-10-01"),
            make_period("2025-10-29"),
        ];
        let insights = generate_insights(&periods, &[], None, date("2025-11-01"));

        assert!(!ids(&insights).contains(&"regular-cycles"));
        assert!(!ids(&insights).contains(&"irregular-cycles"));
    }

    #[test]
    fn recurring_pre_period_symptom_is_surfaced() {
        let periods = vec![make_period("2025-10-01"), make_period("2025-10-29")];
        let symptoms = vec![
            Symptom::new(date("2025-09-29"), SymptomType::Cramps, 3),
            Symptom::new(date("2025-10-27"), SymptomType::Cramps, 2),
        ];
        let insights = generate_insights(&periods, &symptoms, None, date("2025-11-01"));

        assert_eq!(insights[0].id, "pre-period-pattern");
        assert!(insights[0].description.contains("Cramps"));
    }

    #[test]
    fn lone_pre_period_symptom_is_not_a_pattern() {
        let periods = vec![make_period("2025-10-01"), make_period("2025-10-29")];
        let symptoms = vec![Symptom::new(date("2025-10-27"), SymptomType::Cramps, 2)];
        let insights = generate_insights(&periods, &symptoms, None, date("2025-11-01"));

        assert!(!ids(&insights).contains(&"pre-period-pattern"));
    }

    #[test]
    fn phase_tip_tracks_the_current_cycle_day() {
        let periods = periods_28_apart(2);
        let prediction = predict(&periods, PredictorOptions::default()).unwrap();

        // Last start 2025-10-01; day 2 is menstrual, day 20 is luteal.
        let on_day_2 =
            generate_insights(&periods, &[], Some(&prediction), date("2025-10-02"));
        let tip = on_day_2.iter().find(|i| i.id == "phase-tip").unwrap();
        assert_eq!(tip.title, "Menstrual phase");
        assert_eq!(tip.tone, InsightTone::Info);

        let on_day_20 =
            generate_insights(&periods, &[], Some(&prediction), date("2025-10-20"));
        let tip = on_day_20.iter().find(|i| i.id == "phase-tip").unwrap();
        assert_eq!(tip.title, "Luteal phase");
    }

    #[test]
    fn no_prediction_means_no_phase_tip() {
        let periods = periods_28_apart(2);
        let insights = generate_insights(&periods, &[], None, date("2025-10-02"));

        assert!(!ids(&insights).contains(&"phase-tip"));
    }

    #[test]
    fn a_week_of_daily_logging_earns_a_streak() {
        let today = date("2025-11-07");
        let symptoms: Vec<Symptom> = (0..7)
            .map(|back| Symptom::new(today - Duration::days(back), SymptomType::Fatigue, 2))
            .collect();
        let insights = generate_insights(&[], &symptoms, None, today);

        let streak = insights.iter().find(|i| i.id == "streak").unwrap();
        assert_eq!(streak.tone, InsightTone::Positive);
        assert!(streak.description.contains('7'));
    }

    #[test]
    fn a_gap_today_breaks_the_streak() {
        let today = date("2025-11-07");
        // Seven consecutive days, but the most recent is yesterday.
        let symptoms: Vec<Symptom> = (1..8)
            .map(|back| Symptom::new(today - Duration::days(back), SymptomType::Fatigue, 2))
            .collect();
        let insights = generate_insights(&[], &symptoms, None, today);

        assert!(!ids(&insights).contains(&"streak"));
    }

    #[test]
    fn easing_severity_is_noticed() {
        // Ten records two days apart: older half severity 4, newer half 3.
        let anchor = date("2025-09-01");
        let symptoms: Vec<Symptom> = (0..10)
            .map(|i| {
                let severity = if i < 5 { 4 } else { 3 };
                Symptom::new(anchor + Duration::days(2 * i), SymptomType::Headache, severity)
            })
            .collect();
        let insights = generate_insights(&[], &symptoms, None, date("2025-10-01"));

        let trend = insights.iter().find(|i| i.id == "severity-down").unwrap();
        assert_eq!(trend.tone, InsightTone::Positive);
    }

    #[test]
    fn worsening_severity_warns() {
        let anchor = date("2025-09-01");
        let symptoms: Vec<Symptom> = (0..10)
            .map(|i| {
                let severity = if i < 5 { 2 } else { 3 };
                Symptom::new(anchor + Duration::days(2 * i), SymptomType::Headache, severity)
            })
            .collect();
        let insights = generate_insights(&[], &symptoms, None, date("2025-10-01"));

        let trend = insights.iter().find(|i| i.id == "severity-up").unwrap();
        assert_eq!(trend.tone, InsightTone::Warning);
    }

    #[test]
    fn empty_history_gets_the_getting_started_nudge() {
        let insights = generate_insights(&[], &[], None, date("2025-10-01"));

        assert_eq!(ids(&insights), vec!["getting-started"]);
    }

    #[test]
    fn nearly_enough_periods_gets_a_count_nudge() {
        let periods = vec![make_period("2025-10-01"), make_period("2025-10-29")];
        let insights = generate_insights(&periods, &[], None, date("2025-11-01"));

        let nudge = insights.iter().find(|i| i.id == "more-data").unwrap();
        assert!(nudge.description.contains("1 more period"));
    }

    #[test]
    fn soft_deleted_periods_do_not_count_anywhere() {
        let mut periods = periods_28_apart(4);
        for p in &mut periods {
            p.deleted_at = Some(chrono::Utc::now());
        }
        let insights = generate_insights(&periods, &[], None, date("2025-12-01"));

        assert_eq!(ids(&insights), vec!["getting-started"]);
    }

    #[test]
    fn never_more_than_three_and_priority_ordered() {
        // Regularity, pre-period, phase tip, streak, severity and engagement
        // could all have something to say; only the first three survive.
        let periods = periods_28_apart(4);
        let last_start = date("2025-11-26");
        let today = last_start + Duration::days(1);
        let prediction = predict(&periods, PredictorOptions::default()).unwrap();

        let mut symptoms: Vec<Symptom> = (0..10)
            .map(|back| Symptom::new(today - Duration::days(back), SymptomType::Fatigue, 2))
            .collect();
        // Cramps shortly before the two most recent starts.
        symptoms.push(Symptom::new(date("2025-11-24"), SymptomType::Cramps, 3));
        symptoms.push(Symptom::new(date("2025-10-27"), SymptomType::Cramps, 3));

        let insights = generate_insights(&periods, &symptoms, Some(&prediction), today);
        assert_eq!(
            ids(&insights),
            vec!["regular-cycles", "pre-period-pattern", "phase-tip"]
        );
    }

    #[test]
    fn identical_inputs_give_identical_insights() {
        let periods = periods_28_apart(4);
        let symptoms = vec![
            Symptom::new(date("2025-11-24"), SymptomType::Cramps, 3),
            Symptom::new(date("2025-10-27"), SymptomType::Cramps, 3),
        ];
        let today = date("2025-12-01");

        let first = generate_insights(&periods, &symptoms, None, today);
        let second = generate_insights(&periods, &symptoms, None, today);
        assert_eq!(first, second);
    }
}
