//! Guided appraisal flow.
//!
//! Walks the seller through: item search → model pick → specs → condition →
//! photo → appraisal. Each answer is fed into the `AppraisalSession`, which
//! rejects out-of-order steps. Esc or Ctrl+C at any prompt returns to the menu.

use super::{handle_interrupt, report_failure};
use crate::cli::appraise::{load_photo, print_record, with_spinner};
use console::Style;
use dialoguer::{Confirm, Input, Select};
use anyhow::Context;
use genie_core::config::OutputConfig;
use genie_core::{
    AppraisalRecord, AppraisalSession, Appraiser, Condition, Config, ImageInput, OutputFormat,
    OutputWriter,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::theme::genie_theme;

/// One full appraisal. The session is reset on the way out, whatever happens.
pub async fn guided_appraisal(
    appraiser: &Appraiser,
    session: &mut AppraisalSession,
    config: &Config,
) -> anyhow::Result<()> {
    session.reset();
    let outcome = run_steps(appraiser, session, config).await;
    session.reset();
    outcome
}

async fn run_steps(
    appraiser: &Appraiser,
    session: &mut AppraisalSession,
    config: &Config,
) -> anyhow::Result<()> {
    let theme = genie_theme();
    let dim = Style::new().for_stderr().dim();

    // ── Step 1: search ──────────────────────────────────────────────────────

    let Some(query) = prompt_text("What are you selling? (e.g. \"LG TV\")")? else {
        return Ok(());
    };

    let suggestions = match with_spinner(
        "Finding matching models...",
        appraiser.suggest_models(&query),
    )
    .await
    {
        Ok(suggestions) => suggestions,
        Err(e) => {
            report_failure(&e);
            Vec::new()
        }
    };

    let mut choices = suggestions.clone();
    choices.push(format!("Use my own description: {query}"));
    let Some(pick) = Select::with_theme(&theme)
        .with_prompt("Which one is it?")
        .items(&choices)
        .default(0)
        .interact_opt()?
    else {
        return Ok(());
    };
    let item = suggestions.get(pick).cloned().unwrap_or(query);
    session.select_item(item.as_str())?;

    // ── Step 2: specs ───────────────────────────────────────────────────────

    let spec_options = match with_spinner("Looking up attributes...", appraiser.item_specs(&item))
        .await
    {
        Ok(options) => options,
        Err(e) => {
            report_failure(&e);
            eprintln!("  {}", dim.apply_to("Continuing without specs."));
            BTreeMap::new()
        }
    };
    session.set_spec_options(spec_options)?;

    let attributes: Vec<(String, Vec<String>)> = session
        .spec_options()
        .iter()
        .map(|(name, options)| (name.clone(), options.clone()))
        .collect();
    for (attribute, options) in attributes {
        let Some(choice) = Select::with_theme(&theme)
            .with_prompt(attribute.as_str())
            .items(&options)
            .default(0)
            .interact_opt()?
        else {
            return Ok(());
        };
        session.choose_spec(&attribute, &options[choice])?;
    }
    session.confirm_specs()?;

    // ── Step 3: condition ───────────────────────────────────────────────────

    let labels: Vec<&str> = Condition::ALL.iter().map(|c| c.label()).collect();
    let Some(choice) = Select::with_theme(&theme)
        .with_prompt("Condition")
        .items(&labels)
        .default(0)
        .interact_opt()?
    else {
        return Ok(());
    };
    session.set_condition(Condition::ALL[choice])?;

    // ── Step 4: photo (optional) ────────────────────────────────────────────

    if let Some(photo) = prompt_photo(config, "Photo of the item (Enter to skip)").await? {
        session.attach_photo(photo)?;
    }

    // ── Step 5: appraise, with retry on failure ─────────────────────────────

    let request = session.build_request()?;
    loop {
        match with_spinner("Appraising...", appraiser.appraise(&request)).await {
            Ok(record) => {
                print_record(&record);
                session.record_result(record)?;
                break;
            }
            Err(e) => {
                report_failure(&e);
                let retry = handle_interrupt(
                    Confirm::with_theme(&theme)
                        .with_prompt("Try again?")
                        .default(true)
                        .interact(),
                )?;
                if retry != Some(true) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Demand score for an item.
pub async fn guided_hype(appraiser: &Appraiser) -> anyhow::Result<()> {
    let Some(item) = prompt_text("Item to check")? else {
        return Ok(());
    };
    match with_spinner("Checking demand...", appraiser.hype_score(&item)).await {
        Ok(score) => {
            let cyan = Style::new().for_stderr().cyan();
            eprintln!();
            eprintln!("  {} {}", cyan.apply_to("Hype score:"), hype_meter(score));
            eprintln!();
        }
        Err(e) => report_failure(&e),
    }
    Ok(())
}

/// IMEI lookup from a photo.
pub async fn guided_imei(appraiser: &Appraiser, config: &Config) -> anyhow::Result<()> {
    let Some(photo) = prompt_photo(config, "Photo showing the IMEI").await? else {
        return Ok(());
    };
    match with_spinner("Reading IMEI...", appraiser.read_imei(photo)).await {
        Ok(imei) => {
            let green = Style::new().for_stderr().green();
            eprintln!();
            eprintln!("  IMEI: {}", green.apply_to(imei));
            eprintln!();
        }
        Err(e) => report_failure(&e),
    }
    Ok(())
}

/// List finished appraisals and optionally export them.
pub fn show_history(session: &AppraisalSession, config: &Config) -> anyhow::Result<()> {
    let dim = Style::new().for_stderr().dim();
    let history = session.history();

    eprintln!();
    if history.is_empty() {
        eprintln!("  {}", dim.apply_to("No appraisals yet."));
        eprintln!();
        return Ok(());
    }
    for (i, record) in history.iter().enumerate() {
        eprintln!(
            "  {}. {} {} {} - {}",
            i + 1,
            record.item,
            dim.apply_to("→"),
            record.result.low_price,
            record.result.high_price
        );
    }
    eprintln!();

    let theme = genie_theme();
    let export = handle_interrupt(
        Confirm::with_theme(&theme)
            .with_prompt("Export to a file?")
            .default(false)
            .interact(),
    )?;
    if export != Some(true) {
        return Ok(());
    }

    let default_name = match OutputFormat::parse(&config.output.format) {
        Some(OutputFormat::JsonLines) => "appraisals.jsonl",
        _ => "appraisals.json",
    };
    let Some(raw_path) = handle_interrupt(
        Input::<String>::with_theme(&theme)
            .with_prompt("Output file")
            .default(default_name.to_string())
            .interact_text(),
    )?
    else {
        return Ok(());
    };

    let path = PathBuf::from(shellexpand::tilde(&raw_path).into_owned());
    match export_history(&path, history, &config.output) {
        Ok(written) => {
            eprintln!(
                "  {}",
                dim.apply_to(format!(
                    "Wrote {written} appraisal(s) to {}",
                    path.display()
                ))
            );
            eprintln!();
        }
        Err(e) => report_failure(&format!("{e:#}")),
    }
    Ok(())
}

/// Write `records` to `path` in the configured format. Returns the count written.
fn export_history(
    path: &Path,
    records: &[AppraisalRecord],
    output: &OutputConfig,
) -> anyhow::Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Could not create {}", path.display()))?;
    let mut writer = OutputWriter::from_config(BufWriter::new(file), output);
    writer
        .write_history(records)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Could not write {}", path.display()))?;
    Ok(writer.records_written())
}

/// Prompt for non-blank text. `None` on interrupt or empty input.
fn prompt_text(prompt: &str) -> anyhow::Result<Option<String>> {
    let theme = genie_theme();
    let text = handle_interrupt(
        Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text(),
    )?;
    Ok(text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// Prompt for a photo path until one loads. `None` when skipped.
async fn prompt_photo(config: &Config, prompt: &str) -> anyhow::Result<Option<ImageInput>> {
    let warn = Style::new().for_stderr().yellow();
    loop {
        let Some(raw_path) = prompt_text(prompt)? else {
            return Ok(None);
        };
        match load_photo(&PathBuf::from(raw_path), config).await {
            Ok(photo) => return Ok(Some(photo)),
            Err(e) => eprintln!("  {}", warn.apply_to(format!("{e:#}"))),
        }
    }
}

/// "7/10 ███████░░░"
fn hype_meter(score: u8) -> String {
    let filled = usize::from(score.min(10));
    format!(
        "{score}/10 {}{}",
        "█".repeat(filled),
        "░".repeat(10 - filled)
    )
}
