//! Interactive decisions.
//!
//! The pipeline never reads the terminal itself. Every question it asks goes
//! through an [`Interaction`], so the CLI can prompt on a console while tests
//! (and unattended runs) answer programmatically.

use std::path::Path;

/// Capability for yes/no questions, menu choices and paged file review.
pub trait Interaction: Send + Sync {
    /// Ask a yes/no question. Anything but an explicit yes is `false`.
    fn confirm(&self, prompt: &str) -> bool;

    /// Offer a numbered menu and return the chosen 0-based index.
    ///
    /// Returns None when the answer is empty or cannot be interpreted; callers
    /// decide the default and must bounds-check the index.
    fn select(&self, prompt: &str, options: &[String]) -> Option<usize>;

    /// Show a file to the operator for inspection before acting on it.
    fn review(&self, path: &Path);
}

/// Answers every question affirmatively and picks the first option.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Interaction for AssumeYes {
    fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, "auto-confirmed");
        true
    }

    fn select(&self, prompt: &str, _options: &[String]) -> Option<usize> {
        tracing::debug!(prompt, "auto-selected first option");
        Some(0)
    }

    fn review(&self, _path: &Path) {}
}
