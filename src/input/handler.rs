use crate::controller::TaskController;
use crate::domain::{parse_due_input, task_line, validate_new_task, Task};
use crate::error::TaskinError;
use crate::notify::NotificationPlatform;
use crate::remote::TaskStore;
use chrono::{DateTime, Utc};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One line of input from the interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add {
        title: String,
        description: String,
        due: Option<DateTime<Utc>>,
    },
    Toggle(String),
    Delete(String),
    Refresh,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  list                                   show tasks
  add <title> [| description] [@ due]    due is +20m, +2h, +1d or a date
  toggle <id>                            complete or reopen a task
  delete <id>                            delete a task
  refresh                                reload from the server
  quit";

fn invalid(reason: impl Into<String>) -> TaskinError {
    TaskinError::Validation(reason.into())
}

/// Parse a session line. Blank lines yield `None`.
pub fn parse_command(line: &str, now: DateTime<Utc>) -> Result<Option<Command>, TaskinError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_lowercase().as_str() {
        "list" | "ls" => Command::List,
        "refresh" | "r" => Command::Refresh,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "toggle" | "done" | "t" => Command::Toggle(required_id(verb, rest)?),
        "delete" | "rm" | "d" => Command::Delete(required_id(verb, rest)?),
        "add" | "a" => parse_add(rest, now)?,
        other => return Err(invalid(format!("Unknown command '{}', try 'help'", other))),
    };
    Ok(Some(command))
}

fn required_id(verb: &str, rest: &str) -> Result<String, TaskinError> {
    match rest.split_whitespace().next() {
        Some(id) => Ok(id.to_string()),
        None => Err(invalid(format!("Usage: {} <id>", verb))),
    }
}

/// Split off a trailing ` @ <due>`; an `@` inside a word (an email address) is text
fn split_due(rest: &str) -> Option<(&str, &str)> {
    rest.rfind(" @").map(|at| (&rest[..at], &rest[at + 2..]))
}

fn parse_add(rest: &str, now: DateTime<Utc>) -> Result<Command, TaskinError> {
    let (text, due) = match split_due(rest) {
        Some((text, raw)) => {
            let due = parse_due_input(raw, now)
                .ok_or_else(|| invalid(format!("Unrecognised due date '{}'", raw.trim())))?;
            (text, Some(due))
        }
        None => (rest, None),
    };
    let (title, description) = match text.split_once('|') {
        Some((title, description)) => (title.trim(), description.trim()),
        None => (text.trim(), ""),
    };

    validate_new_task(title, description)?;
    Ok(Command::Add {
        title: title.to_string(),
        description: description.to_string(),
        due,
    })
}

/// Render the task list, one line per task
pub fn render_tasks(tasks: &[Task], now: DateTime<Utc>) -> String {
    if tasks.is_empty() {
        return "No tasks yet. Add one with 'add <title>'.".to_string();
    }
    tasks
        .iter()
        .map(|task| task_line(task, now))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run one command against the controller. Returns true when the session should end.
pub async fn handle_command<S, P>(controller: &TaskController<S, P>, command: Command) -> bool
where
    S: TaskStore + ?Sized + 'static,
    P: NotificationPlatform + ?Sized + 'static,
{
    let result = match command {
        Command::Quit => return true,
        Command::Help => {
            println!("{}", HELP);
            return false;
        }
        Command::List => Ok(()),
        Command::Refresh => controller.refresh().await,
        Command::Add {
            title,
            description,
            due,
        } => controller
            .add_task(&title, &description, due)
            .await
            .map(|task| println!("Added task {}", task.id)),
        Command::Toggle(id) => match controller.find(&id) {
            Some(_) => controller.toggle_task(&id).await,
            None => Err(invalid(format!("No task with id {}", id))),
        },
        Command::Delete(id) => match controller.find(&id) {
            Some(_) => controller.delete_task(&id).await,
            None => Err(invalid(format!("No task with id {}", id))),
        },
    };

    match result {
        Ok(()) => println!("{}", render_tasks(&controller.tasks(), Utc::now())),
        Err(TaskinError::Validation(reason)) => eprintln!("{}", reason),
        Err(_) => {
            if let Some(message) = controller.snapshot().last_error {
                eprintln!("{}", message);
            }
        }
    }
    false
}

/// Why an interactive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    EndOfInput,
    Interrupted,
}

/// Run commands read line by line from `input` until quit, end of input, or
/// `interrupt` resolves. `interrupt` is watched while a command runs too, so an
/// in-flight operation is abandoned rather than delaying teardown.
pub async fn run_session<S, P, R, I>(
    controller: &TaskController<S, P>,
    input: R,
    interrupt: I,
) -> std::io::Result<SessionEnd>
where
    S: TaskStore + ?Sized + 'static,
    P: NotificationPlatform + ?Sized + 'static,
    R: AsyncBufRead + Unpin,
    I: Future,
{
    let mut lines = input.lines();
    tokio::pin!(interrupt);

    loop {
        let line = tokio::select! {
            _ = &mut interrupt => return Ok(SessionEnd::Interrupted),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            return Ok(SessionEnd::EndOfInput);
        };
        let command = match parse_command(&line, Utc::now()) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e.user_message("read command"));
                continue;
            }
        };
        tokio::select! {
            _ = &mut interrupt => return Ok(SessionEnd::Interrupted),
            quit = handle_command(controller, command) => {
                if quit {
                    return Ok(SessionEnd::Quit);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, TaskPatch, TaskRecord};
    use crate::error::RemoteError;
    use crate::testing::{FakePlatform, FakeStore};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tokio::io::BufReader;

    /// Store whose calls never complete
    struct StalledStore;

    #[async_trait]
    impl TaskStore for StalledStore {
        async fn list(&self) -> Result<Vec<TaskRecord>, RemoteError> {
            std::future::pending().await
        }

        async fn create(&self, _task: &NewTask) -> Result<TaskRecord, RemoteError> {
            std::future::pending().await
        }

        async fn update(&self, _id: &str, _patch: &TaskPatch) -> Result<(), RemoteError> {
            std::future::pending().await
        }

        async fn complete(&self, _id: &str) -> Result<(), RemoteError> {
            std::future::pending().await
        }

        async fn delete(&self, _id: &str) -> Result<(), RemoteError> {
            std::future::pending().await
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn parse(line: &str) -> Command {
        parse_command(line, now()).unwrap().unwrap()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("list"), Command::List);
        assert_eq!(parse("  Refresh "), Command::Refresh);
        assert_eq!(parse("q"), Command::Quit);
        assert_eq!(parse("toggle 7"), Command::Toggle("7".to_string()));
        assert_eq!(parse("rm 12"), Command::Delete("12".to_string()));
        assert_eq!(parse_command("   ", now()).unwrap(), None);
    }

    #[test]
    fn test_parse_add_with_description_and_due() {
        assert_eq!(
            parse("add Pay bills | electricity and water @ +20m"),
            Command::Add {
                title: "Pay bills".to_string(),
                description: "electricity and water".to_string(),
                due: Some(now() + Duration::minutes(20)),
            }
        );
    }

    #[test]
    fn test_parse_add_title_only() {
        assert_eq!(
            parse("add Stretch"),
            Command::Add {
                title: "Stretch".to_string(),
                description: String::new(),
                due: None,
            }
        );
    }

    #[test]
    fn test_parse_add_keeps_email_addresses_in_text() {
        assert_eq!(
            parse("add Email bob | write to bob@example.com"),
            Command::Add {
                title: "Email bob".to_string(),
                description: "write to bob@example.com".to_string(),
                due: None,
            }
        );
        assert_eq!(
            parse("add Email bob | write to bob@example.com @ +2h"),
            Command::Add {
                title: "Email bob".to_string(),
                description: "write to bob@example.com".to_string(),
                due: Some(now() + Duration::hours(2)),
            }
        );
    }

    #[test]
    fn test_parse_add_rejects_out_of_range_due_offsets() {
        for line in ["add x @ +1000000000d", "add x @ +999999999999999999m"] {
            assert!(matches!(
                parse_command(line, now()),
                Err(TaskinError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_command("add", now()),
            Err(TaskinError::Validation(_))
        ));
        assert!(parse_command("add Pay bills @ someday", now()).is_err());
        assert!(parse_command("toggle", now()).is_err());
        assert!(parse_command("frobnicate", now()).is_err());

        let long = vec!["word"; 41].join(" ");
        let err = parse_command(&format!("add Essay | {}", long), now()).unwrap_err();
        assert_eq!(err.to_string(), "invalid task: Description has 41 words, maximum is 40");
    }

    #[test]
    fn test_render_empty() {
        assert!(render_tasks(&[], now()).starts_with("No tasks yet"));
    }

    #[tokio::test]
    async fn test_handle_add_then_quit() {
        let store = Arc::new(FakeStore::default());
        let controller = TaskController::new(Arc::clone(&store), Arc::new(FakePlatform::default()));

        let quit = handle_command(&controller, parse("add Stretch")).await;
        assert!(!quit);
        assert_eq!(store.records().len(), 1);

        assert!(handle_command(&controller, Command::Quit).await);
    }

    #[tokio::test]
    async fn test_handle_toggle_unknown_id_makes_no_calls() {
        let store = Arc::new(FakeStore::default());
        let controller = TaskController::new(Arc::clone(&store), Arc::new(FakePlatform::default()));

        assert!(!handle_command(&controller, Command::Toggle("9".to_string())).await);
        assert!(controller.pending_deletes().is_empty());
    }

    #[tokio::test]
    async fn test_session_stops_at_quit() {
        let store = Arc::new(FakeStore::default());
        let controller = TaskController::new(Arc::clone(&store), Arc::new(FakePlatform::default()));
        let input = BufReader::new(&b"add Stretch\n\nquit\nadd Never\n"[..]);

        let end = run_session(&controller, input, std::future::pending::<()>()).await.unwrap();

        assert_eq!(end, SessionEnd::Quit);
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_session_ends_with_input() {
        let controller = TaskController::new(
            Arc::new(FakeStore::default()),
            Arc::new(FakePlatform::default()),
        );
        let input = BufReader::new(&b"list\nfrobnicate\n"[..]);

        let end = run_session(&controller, input, std::future::pending::<()>()).await.unwrap();

        assert_eq!(end, SessionEnd::EndOfInput);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_in_flight_operation_ends_session() {
        let controller = TaskController::new(Arc::new(StalledStore), Arc::new(FakePlatform::default()));
        let input = BufReader::new(&b"refresh\nlist\n"[..]);
        let interrupt = tokio::time::sleep(std::time::Duration::from_secs(1));

        let end = run_session(&controller, input, interrupt).await.unwrap();

        assert_eq!(end, SessionEnd::Interrupted);
        assert!(!controller.snapshot().loading);
    }
}
