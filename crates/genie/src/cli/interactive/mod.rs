//! Interactive CLI mode: guided experience for bare `genie` invocation.
//!
//! When `genie` is invoked with no subcommand on a TTY, this module walks the
//! seller through search → specs → condition → photo → result using the same
//! `Appraiser` as the one-shot commands. Finished appraisals are kept in the
//! session history until the program exits.

pub mod flow;
pub mod setup;
pub mod theme;

use console::Style;
use dialoguer::Select;
use genie_core::{AppraisalSession, Config};

/// Convert a dialoguer result into `Ok(Some(value))` on success, `Ok(None)` on
/// interrupt (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Main menu options presented to the seller.
const MENU_ITEMS: &[&str] = &[
    "Appraise an item",
    "Check buyer demand (hype score)",
    "Read a phone's IMEI from a photo",
    "Session history",
    "Configure settings",
    "Exit",
];

/// Entry point for interactive mode.
pub async fn run(mut config: Config) -> anyhow::Result<()> {
    theme::print_banner();

    if !setup::ensure_provider_key(&mut config)? {
        anyhow::bail!("An API key for Gemini, Groq or Grok is required");
    }
    let appraiser = crate::cli::appraise::build_appraiser(&config)?;
    let mut session = AppraisalSession::new();

    let theme = theme::genie_theme();

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(MENU_ITEMS)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => flow::guided_appraisal(&appraiser, &mut session, &config).await?,
            Some(1) => flow::guided_hype(&appraiser).await?,
            Some(2) => flow::guided_imei(&appraiser, &config).await?,
            Some(3) => flow::show_history(&session, &config)?,
            Some(4) => show_config(&config)?,
            Some(5) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// Print a red failure line. The menu stays up so the seller can retry.
pub(crate) fn report_failure(error: &dyn std::fmt::Display) {
    let red = Style::new().for_stderr().red();
    eprintln!("  {} {error}", red.apply_to("✗"));
    eprintln!();
}

/// Summary of current settings, with the full TOML on request.
fn show_config(config: &Config) -> anyhow::Result<()> {
    let theme = theme::genie_theme();
    let dim = Style::new().for_stderr().dim();
    let cyan = Style::new().for_stderr().cyan();
    let label = Style::new().for_stderr().bold();

    loop {
        eprintln!();
        eprintln!("  {}", cyan.apply_to("Current configuration:"));
        eprintln!();

        let config_path = Config::default_path();
        let path_note = if config_path.exists() {
            "(exists)"
        } else {
            "(using defaults)"
        };

        eprintln!(
            "    {:<20} {} {}",
            label.apply_to("Config file:"),
            config_path.display(),
            dim.apply_to(path_note)
        );
        eprintln!(
            "    {:<20} {} attempt(s), {}ms base backoff",
            label.apply_to("Retry:"),
            config.inference.max_attempts,
            config.inference.retry_base_delay_ms
        );
        eprintln!(
            "    {:<20} {}s per call",
            label.apply_to("Timeout:"),
            config.inference.timeout_ms / 1000
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Photos:"),
            if config.photo.downscale {
                format!("downscaled to {}px", config.photo.max_dimension)
            } else {
                "sent as-is".to_string()
            }
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Log level:"),
            config.logging.level
        );
        eprintln!("    {}", label.apply_to("Providers (in order):"));
        for line in provider_summary(config) {
            eprintln!("      {line}");
        }
        eprintln!();

        let items = &["View full config (TOML)", "Show config file path", "Back"];

        let selection = Select::with_theme(&theme)
            .with_prompt("Configuration")
            .items(items)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => match crate::cli::config::redacted(config).to_toml() {
                Ok(toml) => {
                    eprintln!();
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!("{toml}");
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!();
                }
                Err(e) => report_failure(&format!("Failed to serialize config: {e}")),
            },
            Some(1) => {
                eprintln!();
                eprintln!("  {}", Config::default_path().display());
                eprintln!();
            }
            Some(2) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// One line per provider entry: position, kind, model, and where its key comes from.
fn provider_summary(config: &Config) -> Vec<String> {
    config
        .providers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let key = if !p.enabled {
                "disabled".to_string()
            } else if p.has_literal_key() {
                "key in config".to_string()
            } else if setup::has_usable_key(p) {
                format!("key from {}", p.kind.env_var())
            } else {
                format!("no key ({} not set)", p.kind.env_var())
            };
            format!("{}. {} {} ({key})", i + 1, p.kind.label(), p.model)
        })
        .collect()
}
