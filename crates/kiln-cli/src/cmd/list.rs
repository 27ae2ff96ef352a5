use anyhow::Result;
use kiln_core::{Layout, Registry};

use crate::ui::Theme;
use crate::ui::list::{print_list_footer, print_list_header, print_list_row};

/// List all installed packages
pub fn list(layout: &Layout) -> Result<()> {
    let registry = Registry::open(layout.registry_path());
    let packages = registry.load();

    if packages.is_empty() {
        println!();
        println!("  No packages installed.");
        println!("  Run 'kiln install <org/repo>' to get started.");
        return Ok(());
    }

    let theme = Theme::default();
    print_list_header();
    for record in &packages {
        print_list_row(&theme, record);
    }
    print_list_footer(packages.len());
    Ok(())
}
