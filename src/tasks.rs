//! Task-manager edits over the configuration and single-field record edits.
//!
//! Every function here mutates [`AppData`] in memory only. Callers persist the
//! whole document afterwards.

use crate::errors::TaskError;
use crate::models::{
    AppData, DayFilter, Direction, RecordValue, TaskDefinition, TaskForm, TaskKind, date_key,
    parse_date_key,
};
use crate::scorer::parse_minutes;
use chrono::{Datelike, NaiveDate};

impl TaskForm {
    /// Resolves a one-off form into a single-date window on that weekday.
    pub fn into_task(self) -> TaskDefinition {
        let mut task = self.task;
        if let Some(date) = self.once {
            task.start_date = Some(date);
            task.end_date = Some(date);
            task.days = DayFilter::only(date.weekday());
        }
        task.name = task.name.trim().to_string();
        task
    }
}

pub fn validate_task(
    config: &[TaskDefinition],
    task: &TaskDefinition,
    replacing: Option<usize>,
) -> Result<(), TaskError> {
    let name = task.name.trim();
    if name.is_empty() {
        return Err(TaskError::EmptyName);
    }

    let clash = config
        .iter()
        .enumerate()
        .any(|(index, other)| Some(index) != replacing && other.name == name);
    if clash {
        return Err(TaskError::DuplicateName(name.to_string()));
    }

    if !task.weight.is_finite() || task.weight <= 0.0 {
        return Err(TaskError::InvalidWeight(task.weight));
    }

    if task.kind == TaskKind::Time {
        if let Some(target) = task.target.as_deref() {
            if parse_minutes(target).is_none() {
                return Err(TaskError::InvalidTarget(target.to_string()));
            }
        }
    }

    if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
        if start > end {
            return Err(TaskError::InvalidWindow {
                start: date_key(start),
                end: date_key(end),
            });
        }
    }

    if matches!(&task.days, DayFilter::Days(days) if days.is_empty()) {
        return Err(TaskError::NoDays);
    }

    Ok(())
}

pub fn add_task(data: &mut AppData, task: TaskDefinition) -> Result<usize, TaskError> {
    validate_task(&data.config, &task, None)?;
    data.config.push(task);
    Ok(data.config.len() - 1)
}

/// Replaces the task at `index`. A rename carries recorded values over to the new name.
pub fn update_task(data: &mut AppData, index: usize, task: TaskDefinition) -> Result<(), TaskError> {
    if index >= data.config.len() {
        return Err(TaskError::IndexOutOfRange(index));
    }
    validate_task(&data.config, &task, Some(index))?;

    let old_name = data.config[index].name.clone();
    if old_name != task.name {
        for record in data.data.values_mut() {
            if let Some(value) = record.remove(&old_name) {
                record.insert(task.name.clone(), value);
            }
        }
    }
    data.config[index] = task;
    Ok(())
}

pub fn delete_task(data: &mut AppData, index: usize) -> Result<TaskDefinition, TaskError> {
    if index >= data.config.len() {
        return Err(TaskError::IndexOutOfRange(index));
    }
    Ok(data.config.remove(index))
}

/// Swaps a task with its neighbour. Moving past either end leaves the order alone.
pub fn move_task(data: &mut AppData, index: usize, direction: Direction) -> Result<usize, TaskError> {
    let len = data.config.len();
    if index >= len {
        return Err(TaskError::IndexOutOfRange(index));
    }
    let target = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < len => index + 1,
        _ => return Ok(index),
    };
    data.config.swap(index, target);
    Ok(target)
}

/// Writes one field of one day. Blank values clear the field.
pub fn set_value(
    data: &mut AppData,
    date: &str,
    task: &str,
    value: RecordValue,
) -> Result<NaiveDate, TaskError> {
    let date = parse_date_key(date).ok_or_else(|| TaskError::InvalidDate(date.to_string()))?;
    if !data.config.iter().any(|existing| existing.name == task) {
        return Err(TaskError::NoSuchTask(task.to_string()));
    }

    let key = date_key(date);
    if value.is_blank() {
        if let Some(record) = data.data.get_mut(&key) {
            record.remove(task);
            if record.is_empty() {
                data.data.remove(&key);
            }
        }
    } else {
        data.data.entry(key).or_default().insert(task.to_string(), value);
    }

    Ok(date)
}
