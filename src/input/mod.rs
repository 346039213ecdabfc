pub mod handler;

pub use handler::{render_tasks, run_session, SessionEnd};
