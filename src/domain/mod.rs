pub mod enums;
pub mod highlight;
pub mod task;
pub mod views;

pub use enums::ReminderKind;
pub use highlight::Highlight;
pub use task::{join_handles, split_handles, NewTask, Task, TaskPatch, TaskRecord};
pub use views::{format_due_date, is_overdue, parse_due_input, task_line, validate_new_task};
