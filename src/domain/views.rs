use super::task::Task;
use crate::error::TaskinError;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};

/// Maximum number of words allowed in a new task's description
pub const MAX_DESCRIPTION_WORDS: usize = 40;

/// Count whitespace-separated words in a description
pub fn description_word_count(description: &str) -> usize {
    description.split_whitespace().count()
}

/// Validate form input before it is sent to the store
pub fn validate_new_task(title: &str, description: &str) -> Result<(), TaskinError> {
    if title.trim().is_empty() {
        return Err(TaskinError::Validation("Title is required".to_string()));
    }
    let words = description_word_count(description);
    if words > MAX_DESCRIPTION_WORDS {
        return Err(TaskinError::Validation(format!(
            "Description has {} words, maximum is {}",
            words, MAX_DESCRIPTION_WORDS
        )));
    }
    Ok(())
}

/// Whether the task's due date has already passed
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    task.due_date.is_some_and(|due| due < now)
}

/// Human label for a due date, relative to `now` in local time
pub fn format_due_date(due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_due_date_in(&Local, due, now)
}

/// Timezone-explicit variant of [`format_due_date`]
pub fn format_due_date_in<Tz: TimeZone>(tz: &Tz, due: DateTime<Utc>, now: DateTime<Utc>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let due = due.with_timezone(tz);
    let today = now.with_timezone(tz).date_naive();
    let time = due.format("%H:%M");

    if due.date_naive() == today {
        format!("Due today at {}", time)
    } else if Some(due.date_naive()) == today.succ_opt() {
        format!("Due tomorrow at {}", time)
    } else {
        format!("Due {} at {}", due.format("%Y-%m-%d"), time)
    }
}

/// One-line rendering of a task for list output
pub fn task_line(task: &Task, now: DateTime<Utc>) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let mut line = format!("{} {}  {}", check, task.id, task.title);
    if let Some(due) = task.due_date {
        line.push_str("  (");
        line.push_str(&format_due_date(due, now));
        if !task.completed && is_overdue(task, now) {
            line.push_str(", overdue");
        }
        line.push(')');
    }
    if !task.reminder_handles().is_empty() {
        line.push_str("  ⏰");
    }
    line
}

/// Parse a user-supplied due date: `+20m`, `+2h`, `+1d`, or an absolute timestamp
pub fn parse_due_input(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Some(offset) = input.strip_prefix('+') {
        let unit = offset.chars().last()?;
        let amount: i64 = offset[..offset.len() - unit.len_utf8()].parse().ok()?;
        let delta = match unit {
            'm' => Duration::try_minutes(amount),
            'h' => Duration::try_hours(amount),
            'd' => Duration::try_days(amount),
            _ => None,
        }?;
        return now.checked_add_signed(delta);
    }
    super::task::parse_due_date(input)
}
