//! Terminal presentation: styled output, prompts and the package table.

pub mod console;
pub mod list;
pub mod output;
pub mod theme;

pub use console::Console;
pub use output::Output;
pub use theme::Theme;
