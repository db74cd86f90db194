//! Weighted daily completion scoring.
//!
//! A day's percentage is the share of applicable task weight that was earned.
//! Tasks that do not apply to the day (weekday filter or date window) are left
//! out of the total entirely. Unusable recorded values earn nothing but still
//! count toward the total.

use crate::models::{Condition, DayRecord, DayScore, Role, TaskDefinition, TaskKind};
use chrono::{Datelike, NaiveDate, Weekday};

/// Fraction of the weight lost per block of lateness on a `before` task.
const LATE_PENALTY: f64 = 0.2;
const LATE_BLOCK_MINUTES: f64 = 30.0;

pub fn compute_day_score(
    config: &[TaskDefinition],
    date: NaiveDate,
    weekday: Weekday,
    record: Option<&DayRecord>,
) -> DayScore {
    let mut total = 0.0;
    let mut earned = 0.0;
    let mut wake = None;
    let mut sleep = None;

    for task in config {
        if !task.applies_on(date, weekday) {
            continue;
        }

        let weight = task.weight.max(0.0);
        total += weight;

        let Some(value) = record.and_then(|record| record.get(&task.name)) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }

        match task.kind {
            TaskKind::Bool => {
                if value.is_truthy() {
                    earned += weight;
                }
            }
            TaskKind::Score => {
                if let Some(score) = value.as_number() {
                    earned += weight * score.clamp(0.0, 100.0) / 100.0;
                }
            }
            TaskKind::Time => {
                let Some(recorded) = value.as_text().and_then(parse_minutes) else {
                    continue;
                };

                if task.marks(Role::Wake) {
                    wake = Some(recorded / 60.0);
                }
                if task.marks(Role::Sleep) {
                    sleep = Some(sleep_hour(recorded / 60.0));
                }

                if let Some(target) = parse_minutes(task.target_or_midnight()) {
                    earned += time_points(weight, recorded - target, task.condition());
                }
            }
        }
    }

    let percent = if total > 0.0 {
        earned / total * 100.0
    } else {
        0.0
    };

    DayScore {
        percent,
        wake,
        sleep,
    }
}

pub fn score_date(config: &[TaskDefinition], date: NaiveDate, record: Option<&DayRecord>) -> DayScore {
    compute_day_score(config, date, date.weekday(), record)
}

/// Points for a time task given the signed distance from target in minutes.
pub fn time_points(weight: f64, diff_minutes: f64, condition: Condition) -> f64 {
    match condition {
        Condition::Before if diff_minutes <= 0.0 => weight,
        Condition::Before => {
            let penalty = diff_minutes / LATE_BLOCK_MINUTES * LATE_PENALTY;
            (weight * (1.0 - penalty)).max(0.0)
        }
        // Strict cutoff: "after" tasks do not decay.
        Condition::After if diff_minutes >= 0.0 => weight,
        Condition::After => 0.0,
    }
}

/// Parses `HH:MM` (optionally `HH:MM:SS`) into minutes since midnight.
pub fn parse_minutes(raw: &str) -> Option<f64> {
    let mut parts = raw.trim().split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    let seconds: u32 = match parts.next() {
        Some(part) => part.trim().parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }
    Some(f64::from(hours * 60 + minutes) + f64::from(seconds) / 60.0)
}

pub fn parse_hours(raw: &str) -> Option<f64> {
    parse_minutes(raw).map(|minutes| minutes / 60.0)
}

/// Pushes early-morning bedtimes past 24 so overnight trends stay continuous.
pub fn sleep_hour(hours: f64) -> f64 {
    if hours < 12.0 { hours + 24.0 } else { hours }
}
