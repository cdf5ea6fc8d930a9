//! Dialoguer theme and banner for Genie interactive mode.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// Cyan `?` prompts, `▸` for the active item, green `✓` / red `✗` verdicts.
pub fn genie_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().cyan(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        active_item_prefix: style("▸".to_string()).for_stderr().cyan(),
        active_item_style: Style::new().for_stderr().cyan(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Prints the Genie banner to stderr.
pub fn print_banner() {
    let version_line = format!("Genie v{}", genie_core::VERSION);
    let tagline = "Snap it, describe it, price it";

    let inner_width = tagline.chars().count().max(version_line.len()) + 8;

    let cyan = Style::new().for_stderr().cyan();

    eprintln!();
    eprintln!("{}", cyan.apply_to(format!("  ╔{:═<inner_width$}╗", "")));
    eprintln!("{}", cyan.apply_to(format!("  ║{version_line:^inner_width$}║")));
    eprintln!("{}", cyan.apply_to(format!("  ║{tagline:^inner_width$}║")));
    eprintln!("{}", cyan.apply_to(format!("  ╚{:═<inner_width$}╝", "")));
    eprintln!();
}
