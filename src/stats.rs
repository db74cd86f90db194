use crate::models::{
    AppData, Cell, ChartPoint, ChartSeries, DayRow, ScoreBand, SeriesResponse, SleepSpan,
    TaskColumn, WeekView, date_key, parse_date_key,
};
use crate::scorer::score_date;
use chrono::{Datelike, Duration, NaiveDate};

pub fn build_week(data: &AppData, monday: NaiveDate) -> WeekView {
    let start = week_start(monday);
    let end = start + Duration::days(6);

    let columns = data
        .config
        .iter()
        .map(|task| TaskColumn {
            name: task.name.clone(),
            kind: task.kind,
            weight: task.weight,
        })
        .collect();

    let rows = week_dates(start)
        .map(|date| {
            let record = data.record(date);
            let cells = data
                .config
                .iter()
                .map(|task| {
                    if task.applies_on(date, date.weekday()) {
                        Cell::Value(record.and_then(|record| record.get(&task.name)).cloned())
                    } else {
                        Cell::NotApplicable
                    }
                })
                .collect();
            let score = score_date(&data.config, date, record);
            DayRow {
                date: date_key(date),
                weekday: date.weekday().to_string(),
                cells,
                band: ScoreBand::of(score.percent),
                score,
            }
        })
        .collect();

    WeekView {
        label: week_label(start, end),
        start_date: date_key(start),
        end_date: date_key(end),
        columns,
        rows,
    }
}

pub fn build_series(data: &AppData, dates: impl IntoIterator<Item = NaiveDate>) -> ChartSeries {
    let mut series = ChartSeries::default();
    for date in dates {
        let score = score_date(&data.config, date, data.record(date));
        let key = date_key(date);
        if let Some(wake) = score.wake {
            series.wake.push(ChartPoint {
                date: key.clone(),
                value: wake,
            });
        }
        if let Some(sleep) = score.sleep {
            series.sleep.push(ChartPoint {
                date: key.clone(),
                value: sleep,
            });
        }
        series.score.push(ChartPoint {
            date: key,
            value: score.percent,
        });
    }
    series
}

pub fn build_week_series(data: &AppData, monday: NaiveDate) -> ChartSeries {
    build_series(data, week_dates(week_start(monday)))
}

/// Series over every recorded date, oldest first. Unparseable keys are skipped.
pub fn build_history(data: &AppData) -> ChartSeries {
    let mut dates: Vec<NaiveDate> = data.data.keys().filter_map(|key| parse_date_key(key)).collect();
    dates.sort();
    dates.dedup();
    build_series(data, dates)
}

pub fn describe_series(series: ChartSeries) -> SeriesResponse {
    SeriesResponse {
        score_segments: segments(&series.score),
        wake_segments: segments(&series.wake),
        sleep_segments: segments(&series.sleep),
        sleep_spans: sleep_spans(&series),
        series,
    }
}

/// Splits points into runs of calendar-consecutive dates so gaps break the line.
pub fn segments(points: &[ChartPoint]) -> Vec<Vec<ChartPoint>> {
    let mut runs: Vec<Vec<ChartPoint>> = Vec::new();
    let mut previous: Option<NaiveDate> = None;

    for point in points {
        let Some(date) = parse_date_key(&point.date) else {
            continue;
        };
        let continues = previous.is_some_and(|prev| date - prev == Duration::days(1));
        match runs.last_mut() {
            Some(run) if continues => run.push(point.clone()),
            _ => runs.push(vec![point.clone()]),
        }
        previous = Some(date);
    }

    runs
}

/// Pairs each night's bedtime with the next morning's wake time.
pub fn sleep_spans(series: &ChartSeries) -> Vec<SleepSpan> {
    let mut spans = Vec::new();
    for sleep in &series.sleep {
        let Some(slept_on) = parse_date_key(&sleep.date) else {
            continue;
        };
        let woke_on = date_key(slept_on + Duration::days(1));
        let Some(wake) = series.wake.iter().find(|wake| wake.date == woke_on) else {
            continue;
        };

        let bedtime = if sleep.value >= 24.0 { sleep.value - 24.0 } else { sleep.value };
        let mut hours = if wake.value < bedtime {
            24.0 - bedtime + wake.value
        } else {
            wake.value - bedtime
        };
        if hours < 0.0 {
            hours += 24.0;
        }

        spans.push(SleepSpan {
            slept_on: sleep.date.clone(),
            woke_on,
            hours,
        });
    }
    spans
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn week_dates(start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0..7).map(move |offset| start + Duration::days(offset))
}

fn week_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} - {}", start.format("%b %d"), end.format("%b %d, %Y"))
}
