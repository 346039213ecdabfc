use serde::{Deserialize, Serialize};

/// Which of a task's two reminders this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderKind {
    /// Fires ahead of the due date
    Early,
    /// Fires at the due date
    Due,
}

impl ReminderKind {
    /// Notification title for a task
    pub fn title(&self, task_title: &str) -> String {
        match self {
            Self::Early => format!("Task Due Soon: {}", task_title),
            Self::Due => format!("Task Due Now: {}", task_title),
        }
    }

    /// Notification body; `lead_minutes` is the early reminder's offset
    pub fn body(&self, description: &str, lead_minutes: i64) -> String {
        let description = if description.trim().is_empty() {
            "No description"
        } else {
            description
        };
        match self {
            Self::Early => format!("This task is due in {} minutes!\n{}", lead_minutes, description),
            Self::Due => format!("This task is due now!\n{}", description),
        }
    }

    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Due => "due",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_titles() {
        assert_eq!(ReminderKind::Early.title("Pay bills"), "Task Due Soon: Pay bills");
        assert_eq!(ReminderKind::Due.title("Pay bills"), "Task Due Now: Pay bills");
    }

    #[test]
    fn test_reminder_bodies() {
        assert_eq!(
            ReminderKind::Early.body("", 15),
            "This task is due in 15 minutes!\nNo description"
        );
        assert_eq!(
            ReminderKind::Due.body("electricity + water", 15),
            "This task is due now!\nelectricity + water"
        );
    }
}
