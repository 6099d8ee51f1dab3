//! Synchronous last-resort cleanup

use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Removes the root qdisc of an interface when dropped, unless disarmed.
///
/// The async scope clears the rule on every normal exit; this covers a panic
/// unwinding through the runtime, where no async cleanup can run.
#[derive(Debug)]
pub struct ClearGuard {
    tc_binary: String,
    interface: String,
    armed: bool,
}

impl ClearGuard {
    pub fn new(tc_binary: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            tc_binary: tc_binary.into(),
            interface: interface.into(),
            armed: true,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// The rule was cleared by the async scope; nothing left to do
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ClearGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        debug!(interface = %self.interface, "Clearing traffic rule from drop guard");
        let status = Command::new(&self.tc_binary)
            .args(["qdisc", "del", "dev", &self.interface, "root"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        if let Err(e) = status {
            warn!(interface = %self.interface, "Could not run {}: {}", self.tc_binary, e);
        }
    }
}
