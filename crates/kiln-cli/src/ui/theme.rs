//! UI Theme - Design system constants
//!
//! Colors, icons and column widths shared by every kiln screen.

use crossterm::style::Color;

/// Default theme for kiln output
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Colors for different UI elements
    pub colors: ColorScheme,
    /// Status icons
    pub icons: Icons,
    /// Table layout constants
    pub layout: Layout,
}

/// Color scheme for UI elements
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Package names (primary content)
    pub package_name: Color,
    /// Build system tags
    pub build_system: Color,
    /// Hashes, scopes and other secondary info
    pub secondary: Color,
    /// Headers and labels
    pub header: Color,
    /// Success states
    pub success: Color,
    /// Warning states
    pub warning: Color,
    /// Error states
    pub error: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            package_name: Color::Cyan,
            build_system: Color::White,
            secondary: Color::DarkGrey,
            header: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }
}

/// Status icons for different states
#[derive(Debug, Clone)]
pub struct Icons {
    /// Success/completed state (✓)
    pub success: &'static str,
    /// Error/failed state (✗)
    pub error: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
    /// Info/Tip state (ℹ)
    pub info: &'static str,
    /// Prompt marker (?)
    pub prompt: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
            prompt: "?",
        }
    }
}

/// Column widths for `kiln list`
#[derive(Debug, Clone)]
pub struct Layout {
    /// Width allocated for package name column
    pub name_width: usize,
    /// Width allocated for build system column
    pub system_width: usize,
    /// Width allocated for short hash column
    pub hash_width: usize,
    /// Width allocated for scope column
    pub scope_width: usize,
    /// Width allocated for the static flag column
    pub static_width: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            name_width: 16,
            system_width: 10,
            hash_width: 9,
            scope_width: 7,
            static_width: 7,
        }
    }
}

/// Format a duration in seconds the way summaries print it.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_elapsed(secs: f64) -> String {
    if secs >= 60.0 {
        let whole = secs.round() as u64;
        format!("{}m{:02}s", whole / 60, whole % 60)
    } else {
        format!("{secs:.2}s")
    }
}
