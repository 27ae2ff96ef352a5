//! List output formatting

use crossterm::style::Stylize;
use kiln_core::PackageRecord;

use super::theme::Theme;

/// Section title above the package rows.
pub fn print_list_header() {
    println!();
    println!("{}", "Installed packages".dark_grey());
    println!();
}

/// One aligned row, without color.
pub fn format_row(theme: &Theme, record: &PackageRecord) -> [String; 6] {
    let l = &theme.layout;
    let hash = if record.hash.is_empty() {
        "-".to_string()
    } else {
        record.hash.short().to_string()
    };
    [
        format!("{: <w$}", record.name.as_str(), w = l.name_width),
        format!("{: <w$}", record.build_system.to_string(), w = l.system_width),
        format!("{hash: <w$}", w = l.hash_width),
        format!("{: <w$}", record.scope().to_string(), w = l.scope_width),
        format!(
            "{: <w$}",
            if record.static_link { "static" } else { "" },
            w = l.static_width
        ),
        record.repo.clone(),
    ]
}

/// Print a single package row.
pub fn print_list_row(theme: &Theme, record: &PackageRecord) {
    let c = &theme.colors;
    let [name, system, hash, scope, linkage, repo] = format_row(theme, record);
    println!(
        "  {} {} {} {} {} {}",
        name.with(c.package_name),
        system.with(c.build_system),
        hash.with(c.secondary),
        scope.with(c.secondary),
        linkage.with(c.secondary),
        repo.with(c.secondary)
    );
}

/// Package count under the rows.
pub fn print_list_footer(count: usize) {
    println!();
    let plural = if count == 1 { "" } else { "s" };
    println!("{}", format!("{count} package{plural} installed").dark_grey());
}
