//! Terminal output.
//!
//! Builds stream their own output to the terminal and prompts wait on the
//! operator, so kiln prints synchronously: every message is written in full
//! before the call returns.

use std::io::Write;

use crossterm::style::Stylize;
use kiln_core::Reporter;

use super::theme::{Theme, format_elapsed};

/// Styled status lines on stdout; warnings and errors on stderr.
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
}

impl Output {
    /// Create a new output handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// The theme in use.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    fn out(line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }

    fn err(line: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        Self::out("");
        Self::out(&title.bold().to_string());
    }

    fn done(&self, name: &str, detail: &str) {
        let c = &self.theme.colors;
        Self::out(&format!(
            "  {} {} {}",
            self.theme.icons.success.with(c.success),
            name.with(c.package_name),
            detail.with(c.secondary)
        ));
    }

    fn failed(&self, name: &str, reason: &str) {
        let c = &self.theme.colors;
        Self::err(&format!(
            "  {} {} {}",
            self.theme.icons.error.with(c.error),
            name.with(c.package_name),
            reason.with(c.error)
        ));
    }

    fn info(&self, msg: &str) {
        Self::out(&format!("  {} {msg}", self.theme.icons.info));
    }

    fn success(&self, msg: &str) {
        Self::out(&format!(
            "  {} {}",
            self.theme.icons.success.with(self.theme.colors.success),
            msg.bold()
        ));
    }

    fn warning(&self, msg: &str) {
        Self::err(&format!(
            "  {} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        ));
    }

    fn error(&self, msg: &str) {
        Self::err(&format!(
            "  {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        ));
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        let plural = if count == 1 { "" } else { "s" };
        let msg = format!(
            "{count} package{plural} {action} in {}",
            format_elapsed(elapsed_secs)
        );
        Self::out("");
        self.success(&msg);
    }
}
