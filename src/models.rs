use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Bool,
    Score,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[default]
    Before,
    After,
}

/// Explicit chart role for a time task. Without one, the task name decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Wake,
    Sleep,
}

/// Weekday applicability of a task, stored as `"Daily"` or `"Mon,Wed,Fri"`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DayFilter {
    #[default]
    Daily,
    Days(Vec<Weekday>),
}

impl DayFilter {
    pub fn includes(&self, weekday: Weekday) -> bool {
        match self {
            DayFilter::Daily => true,
            DayFilter::Days(days) => days.contains(&weekday),
        }
    }

    pub fn only(weekday: Weekday) -> Self {
        DayFilter::Days(vec![weekday])
    }
}

impl From<String> for DayFilter {
    fn from(raw: String) -> Self {
        if raw.trim().eq_ignore_ascii_case("daily") {
            return DayFilter::Daily;
        }
        let mut days: Vec<Weekday> = Vec::new();
        for token in raw.split(',') {
            // Unknown tokens are dropped rather than failing the whole document.
            if let Ok(day) = token.trim().parse::<Weekday>() {
                if !days.contains(&day) {
                    days.push(day);
                }
            }
        }
        days.sort_by_key(|day| day.num_days_from_monday());
        DayFilter::Days(days)
    }
}

impl From<DayFilter> for String {
    fn from(filter: DayFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFilter::Daily => f.write_str("Daily"),
            DayFilter::Days(days) => {
                let names: Vec<String> = days.iter().map(|day| day.to_string()).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub days: DayFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>, kind: TaskKind, weight: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            weight,
            target: None,
            condition: None,
            days: DayFilter::Daily,
            start_date: None,
            end_date: None,
            role: None,
        }
    }

    pub fn with_target(mut self, target: &str, condition: Condition) -> Self {
        self.target = Some(target.to_string());
        self.condition = Some(condition);
        self
    }

    pub fn with_days(mut self, days: &str) -> Self {
        self.days = DayFilter::from(days.to_string());
        self
    }

    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn condition(&self) -> Condition {
        self.condition.unwrap_or_default()
    }

    /// Target time, falling back to midnight when none was configured.
    pub fn target_or_midnight(&self) -> &str {
        self.target.as_deref().unwrap_or("00:00")
    }

    pub fn within_window(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
    }

    pub fn applies_on(&self, date: NaiveDate, weekday: Weekday) -> bool {
        self.days.includes(weekday) && self.within_window(date)
    }

    /// Whether this task feeds the given chart marker. An explicit role wins;
    /// otherwise the name is checked, and a name may mark both.
    pub fn marks(&self, role: Role) -> bool {
        if self.kind != TaskKind::Time {
            return false;
        }
        if let Some(explicit) = self.role {
            return explicit == role;
        }
        let lowered = self.name.to_lowercase();
        match role {
            Role::Wake => lowered.contains("wake"),
            Role::Sleep => lowered.contains("sleep"),
        }
    }
}

/// One recorded field: a checkbox, a number, or free text such as `"85"` or `"06:30"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Empty,
}

impl RecordValue {
    pub fn is_blank(&self) -> bool {
        match self {
            RecordValue::Empty => true,
            RecordValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            RecordValue::Flag(flag) => *flag,
            RecordValue::Number(value) => *value != 0.0,
            RecordValue::Text(text) => {
                let text = text.trim();
                !(text.is_empty()
                    || text == "0"
                    || text.eq_ignore_ascii_case("false")
                    || text.eq_ignore_ascii_case("no"))
            }
            RecordValue::Empty => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            RecordValue::Number(value) => *value,
            RecordValue::Text(text) => text.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecordValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

pub type DayRecord = BTreeMap<String, RecordValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub data: BTreeMap<String, DayRecord>,
    #[serde(default = "default_config")]
    pub config: Vec<TaskDefinition>,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            data: BTreeMap::new(),
            config: default_config(),
        }
    }
}

impl AppData {
    pub fn record(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.data.get(&date_key(date))
    }
}

pub fn default_config() -> Vec<TaskDefinition> {
    vec![
        TaskDefinition::new("Wake up", TaskKind::Time, 20.0)
            .with_target("06:00", Condition::Before)
            .with_role(Role::Wake),
        TaskDefinition::new("Gym", TaskKind::Bool, 20.0).with_days("Mon,Tue,Wed,Thu,Fri"),
        TaskDefinition::new("Deep Work", TaskKind::Bool, 20.0).with_days("Mon,Tue,Wed,Thu,Fri"),
        TaskDefinition::new("Reading", TaskKind::Bool, 20.0),
        TaskDefinition::new("Sleep", TaskKind::Time, 20.0)
            .with_target("23:00", Condition::Before)
            .with_role(Role::Sleep),
    ]
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DayScore {
    pub percent: f64,
    pub wake: Option<f64>,
    pub sleep: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Mid,
    Low,
}

impl ScoreBand {
    /// Bands the percent as displayed, so a shown "80%" is always high.
    pub fn of(percent: f64) -> Self {
        let percent = percent.round();
        if percent >= 80.0 {
            ScoreBand::High
        } else if percent >= 50.0 {
            ScoreBand::Mid
        } else {
            ScoreBand::Low
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            ScoreBand::High => "score-high",
            ScoreBand::Mid => "score-mid",
            ScoreBand::Low => "score-low",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    NotApplicable,
    Value(Option<RecordValue>),
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskColumn {
    pub name: String,
    pub kind: TaskKind,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayRow {
    pub date: String,
    pub weekday: String,
    pub cells: Vec<Cell>,
    pub score: DayScore,
    pub band: ScoreBand,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekView {
    pub label: String,
    pub start_date: String,
    pub end_date: String,
    pub columns: Vec<TaskColumn>,
    pub rows: Vec<DayRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepSpan {
    pub slept_on: String,
    pub woke_on: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartSeries {
    pub score: Vec<ChartPoint>,
    pub wake: Vec<ChartPoint>,
    pub sleep: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesResponse {
    pub series: ChartSeries,
    pub score_segments: Vec<Vec<ChartPoint>>,
    pub wake_segments: Vec<Vec<ChartPoint>>,
    pub sleep_segments: Vec<Vec<ChartPoint>>,
    pub sleep_spans: Vec<SleepSpan>,
}

#[derive(Debug, Serialize)]
pub struct WeekResponse {
    pub week: WeekView,
    pub chart: SeriesResponse,
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub start: Option<String>,
    pub week: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub date: String,
    pub task: String,
    #[serde(default = "empty_value")]
    pub value: RecordValue,
}

fn empty_value() -> RecordValue {
    RecordValue::Empty
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordResponse {
    pub date: String,
    pub score: DayScore,
    pub band: ScoreBand,
}

/// Task-manager form: a task plus an optional single date it runs on.
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    #[serde(flatten)]
    pub task: TaskDefinition,
    #[serde(default)]
    pub once: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
