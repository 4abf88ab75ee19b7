//! Interpreter process management (startup/IO).

use tokio::process::{Child, ChildStdin};

pub mod python;

/// A spawned interpreter with its request pipe still open.
pub struct ProcessHandle {
    pub child: Child,
    pub stdin: ChildStdin,
}
