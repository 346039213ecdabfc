//! Desktop delivery of fired reminders.
//! Alerts are only implemented for macOS; elsewhere the reminder is logged.

use super::ReminderRequest;
use crate::config::Presentation;
use std::sync::OnceLock;

static PRESENTATION: OnceLock<Presentation> = OnceLock::new();

/// Install the process-wide presentation settings. Returns false if already installed.
pub fn init_presentation(presentation: Presentation) -> bool {
    PRESENTATION.set(presentation).is_ok()
}

/// Active presentation settings (defaults until [`init_presentation`] runs)
pub fn presentation() -> Presentation {
    PRESENTATION.get().copied().unwrap_or_default()
}

/// Deliver a reminder that just fired
pub fn deliver(request: &ReminderRequest) {
    let settings = presentation();
    tracing::info!(
        task_id = %request.task_id,
        kind = request.kind.to_tag(),
        title = %request.title,
        "reminder fired"
    );

    if !settings.show_alert {
        return;
    }

    #[cfg(target_os = "macos")]
    {
        let mut script = format!(
            r#"display notification "{}" with title "{}""#,
            escape_applescript(&request.body),
            escape_applescript(&request.title)
        );
        if settings.play_sound {
            script.push_str(r#" sound name "default""#);
        }

        if let Err(e) = tokio::process::Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .spawn()
        {
            tracing::warn!(error = %e, "failed to launch osascript");
        }
    }
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
