//! Console prompts.

use std::io::{BufRead, Write};
use std::path::Path;
use std::process::Command;

use crossterm::style::Stylize;
use kiln_core::{Interaction, Reporter};

use super::output::Output;

/// [`Interaction`] on the controlling terminal: prompts on stdout, answers
/// from stdin, file review through `less`.
#[derive(Debug, Clone, Default)]
pub struct Console {
    output: Output,
}

impl Console {
    /// Create a console reporting problems through `output`.
    pub fn new(output: Output) -> Self {
        Self { output }
    }

    fn ask(&self, prompt: &str) -> Option<String> {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(
            stdout,
            "{} {prompt}",
            self.output.theme().icons.prompt.bold()
        );
        let _ = stdout.flush();
        drop(stdout);

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// `y` or `yes`, any case.
pub fn parse_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// A 1-based menu answer as a 0-based index; None when empty or not a number.
pub fn parse_choice(answer: &str) -> Option<usize> {
    answer
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
}

impl Interaction for Console {
    fn confirm(&self, prompt: &str) -> bool {
        self.ask(&format!("{prompt} [y/N]: "))
            .is_some_and(|a| parse_yes(&a))
    }

    fn select(&self, prompt: &str, options: &[String]) -> Option<usize> {
        println!();
        println!("{prompt}");
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
        self.ask(&format!("Choice [1-{}]: ", options.len()))
            .and_then(|a| parse_choice(&a))
    }

    fn review(&self, path: &Path) {
        self.output
            .info("Displaying build file with less (press q to continue)...");
        let status = Command::new("less").arg(path).status();
        match status {
            Ok(s) if s.success() => {}
            Ok(s) => self
                .output
                .warning(&format!("could not display with less: exited with {s}")),
            Err(e) => self
                .output
                .warning(&format!("could not display with less: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yes() {
        assert!(parse_yes("y"));
        assert!(parse_yes(" YES "));
        assert!(!parse_yes(""));
        assert!(!parse_yes("n"));
        assert!(!parse_yes("yep"));
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1"), Some(0));
        assert_eq!(parse_choice(" 3\n"), Some(2));
        assert_eq!(parse_choice(""), None);
        assert_eq!(parse_choice("0"), None);
        assert_eq!(parse_choice("abc"), None);
    }
}
