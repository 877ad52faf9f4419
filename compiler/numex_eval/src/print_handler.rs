//! Destination of DSL `print` output.
//!
//! A program prints once per evaluated block. The handler decides where
//! those lines go: stdout for the CLI, a capture buffer for tests and
//! embedders, or nowhere.

use std::io::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;

pub enum PrintHandler {
    Stdout,
    /// Lines accumulate until taken or cleared.
    Capture(Mutex<String>),
    Silent,
}

impl PrintHandler {
    /// Emit one line; the newline is added here.
    pub fn println(&self, line: &str) {
        match self {
            PrintHandler::Stdout => {
                let mut out = std::io::stdout().lock();
                // A closed stdout is not an evaluation error.
                let _ = writeln!(out, "{line}");
            }
            PrintHandler::Capture(buffer) => {
                let mut buffer = buffer.lock();
                buffer.push_str(line);
                buffer.push('\n');
            }
            PrintHandler::Silent => {}
        }
    }

    /// Everything captured so far. Empty for stdout and silent handlers.
    pub fn captured(&self) -> String {
        match self {
            PrintHandler::Capture(buffer) => buffer.lock().clone(),
            PrintHandler::Stdout | PrintHandler::Silent => String::new(),
        }
    }

    /// Return and clear the captured output.
    pub fn take(&self) -> String {
        match self {
            PrintHandler::Capture(buffer) => std::mem::take(&mut *buffer.lock()),
            PrintHandler::Stdout | PrintHandler::Silent => String::new(),
        }
    }
}

pub type SharedPrintHandler = Arc<PrintHandler>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Stdout)
}

pub fn capture_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Capture(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Silent)
}
