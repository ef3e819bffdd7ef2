//! Colored terminal output.

use console::{Style, Term};

/// Status messages go to stderr; command results go to stdout.
pub(crate) struct Output {
    status: Term,
    data: Term,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            status: Term::stderr(),
            data: Term::stdout(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    /// Print a plain status message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.status.write_line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        let _ = self
            .status
            .write_line(&self.green.apply_to(msg).to_string());
    }

    pub(crate) fn warning(&self, msg: &str) {
        let _ = self
            .status
            .write_line(&self.yellow.apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        let _ = self.status.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a `label: value` line of a record.
    pub(crate) fn field(&self, label: &str, value: &str) {
        let _ = self
            .data
            .write_line(&format!("{} {value}", self.dim.apply_to(format!("{label}:"))));
    }

    /// Print command output verbatim.
    pub(crate) fn data(&self, text: &str) {
        let _ = self.data.write_line(text);
    }
}
