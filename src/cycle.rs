use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Phase;

/// Luteal phase length assumed when locating ovulation (cycle length - 14).
pub const LUTEAL_PHASE_DAYS: i64 = 14;
/// Bleeding days assumed at the top of each cycle.
pub const MENSTRUAL_PHASE_DAYS: i64 = 5;
/// The fertile window opens this many days before ovulation...
pub const FERTILE_WINDOW_LEAD: i64 = 5;
/// ...and closes this many days after it.
pub const FERTILE_WINDOW_TRAIL: i64 = 1;
/// Start-to-start gaps of 60 days or more are treated as data-entry noise.
pub const MAX_CYCLE_GAP_DAYS: i64 = 60;

/// Static presentation data for one cycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseInfo {
    pub phase: Phase,
    pub label: &'static str,
    pub description: &'static str,
    pub partner_tip: &'static str,
    pub color: &'static str,
}

static MENSTRUAL: PhaseInfo = PhaseInfo {
    phase: Phase::Menstrual,
    label: "Menstrual",
    description: "Your period is here. Hormone levels are at their lowest, so energy usually is too.",
    partner_tip: "Extra patience and comfort go a long way right now. Warm drinks and low-key plans are usually welcome.",
    color: "#e05c6e",
};

static FOLLICULAR: PhaseInfo = PhaseInfo {
    phase: Phase::Follicular,
    label: "Follicular",
    description: "Estrogen is rising and energy tends to climb with it. A good window for starting things.",
    partner_tip: "Energy is usually on the way up. A good stretch to plan something active together.",
    color: "#4caf7d",
};

static OVULATION: PhaseInfo = PhaseInfo {
    phase: Phase::Ovulation,
    label: "Ovulation",
    description: "The fertile window peaks around now. Mood and energy are often at their highest.",
    partner_tip: "This is the fertile window, so be mindful. It also tends to be the most energetic stretch of the month.",
    color: "#f2a23c",
};

static LUTEAL: PhaseInfo = PhaseInfo {
    phase: Phase::Luteal,
    label: "Luteal",
    description: "Progesterone takes over and PMS symptoms can surface as the next period approaches.",
    partner_tip: "PMS can show up in this stretch. Small gestures and calm evenings help more than grand plans.",
    color: "#7d6bd1",
};

/// 1-based day count since the most recent period started. Clamped to at
/// least 1 so a `today` before the start (clock skew, edited records) cannot
/// go negative.
pub fn cycle_day(last_period_start: NaiveDate, today: NaiveDate) -> i64 {
    ((today - last_period_start).num_days() + 1).max(1)
}

/// Cycle day on which ovulation is assumed for the given average length.
pub fn ovulation_day(avg_cycle_length: i64) -> i64 {
    avg_cycle_length - LUTEAL_PHASE_DAYS
}

/// The one phase classifier. Every cycle day maps to exactly one phase; for
/// degenerate averages the follicular/ovulation bands collapse to empty and
/// the luteal band absorbs the remainder, so the mapping stays total.
pub fn phase_for_day(cycle_day: i64, avg_cycle_length: i64) -> Phase {
    let day = cycle_day.max(1);
    let ovulation = ovulation_day(avg_cycle_length);

    if day <= MENSTRUAL_PHASE_DAYS {
        Phase::Menstrual
    } else if day <= ovulation - FERTILE_WINDOW_LEAD {
        Phase::Follicular
    } else if day <= ovulation + FERTILE_WINDOW_TRAIL {
        Phase::Ovulation
    } else {
        Phase::Luteal
    }
}

/// Classify a cycle day and return its static presentation data.
pub fn phase_info(cycle_day: i64, avg_cycle_length: i64) -> &'static PhaseInfo {
    phase_catalog(phase_for_day(cycle_day, avg_cycle_length))
}

pub fn phase_catalog(phase: Phase) -> &'static PhaseInfo {
    match phase {
        Phase::Menstrual => &MENSTRUAL,
        Phase::Follicular => &FOLLICULAR,
        Phase::Ovulation => &OVULATION,
        Phase::Luteal => &LUTEAL,
    }
}

/// Noise filter shared by the predictor and the analyzers: a plausible
/// start-to-start gap is strictly between 0 and `MAX_CYCLE_GAP_DAYS`.
pub fn plausible_cycle_gap(days: i64) -> bool {
    days > 0 && days < MAX_CYCLE_GAP_DAYS
}
