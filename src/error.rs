/// Failure talking to the remote task store
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Connection, timeout, or other transport-level failure
    #[error("request failed: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("{method} {path} returned {status}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
    },

    /// Response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

/// Failure from the notification platform
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// Platform refused to schedule (e.g. permission denied, time in the past)
    #[error("notification refused: {0}")]
    Refused(String),

    /// Cancel was asked for a handle the platform does not know
    #[error("unknown notification handle: {0}")]
    UnknownHandle(String),
}

/// Error surfaced by the task controller's top-level operations
#[derive(Debug, thiserror::Error)]
pub enum TaskinError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Rejected input from the producing side (form validation)
    #[error("invalid task: {0}")]
    Validation(String),
}

impl TaskinError {
    /// Message shown to the user for a failed operation
    pub fn user_message(&self, operation: &str) -> String {
        match self {
            TaskinError::Remote(_) => {
                format!("Failed to {}. Please try again.", operation)
            }
            TaskinError::Validation(reason) => reason.clone(),
        }
    }
}
