//! The one-shot commands: `suggest`, `specs`, `appraise`, `hype`, `imei`.

use anyhow::Context;
use clap::{Args, ValueEnum};
use console::Style;
use genie_core::{
    photo, AppraisalRecord, AppraisalRequest, Appraiser, Condition, Config, ImageInput,
    OutputFormat as CoreOutputFormat, OutputWriter,
};
use std::fs::File;
use std::future::Future;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document per record
    Json,
    /// One compact record per line
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// What the seller typed, e.g. "LG TV"
    #[arg(required = true)]
    pub query: String,
}

#[derive(Args, Debug)]
pub struct SpecsArgs {
    /// Specific item, e.g. "LG C3 OLED"
    #[arg(required = true)]
    pub item: String,
}

#[derive(Args, Debug)]
pub struct AppraiseArgs {
    /// Item to appraise
    #[arg(long)]
    pub item: String,

    /// Chosen attribute as NAME=VALUE (repeatable)
    #[arg(long = "spec", value_parser = parse_spec)]
    pub specs: Vec<(String, String)>,

    /// Condition: new, like-new, or used
    #[arg(long, value_parser = parse_condition)]
    pub condition: Option<Condition>,

    /// Photo of the item, used to verify the claim
    #[arg(long)]
    pub photo: Option<PathBuf>,

    /// Output format (defaults to the config's `[output] format`)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct HypeArgs {
    /// Item to score
    #[arg(long)]
    pub item: String,
}

#[derive(Args, Debug)]
pub struct ImeiArgs {
    /// Photo of a settings screen, SIM tray or box label
    #[arg(required = true)]
    pub photo: PathBuf,
}

fn parse_spec(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() {
        return Err(format!("expected NAME=VALUE, got '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_condition(raw: &str) -> Result<Condition, String> {
    Condition::parse(raw).ok_or_else(|| format!("unknown condition '{raw}' (new, like-new, used)"))
}

pub async fn suggest(args: SuggestArgs, config: &Config) -> anyhow::Result<()> {
    let appraiser = build_appraiser(config)?;
    let suggestions = with_spinner("Finding matching models...", appraiser.suggest_models(&args.query)).await?;
    for suggestion in suggestions {
        println!("{suggestion}");
    }
    Ok(())
}

pub async fn specs(args: SpecsArgs, config: &Config) -> anyhow::Result<()> {
    let appraiser = build_appraiser(config)?;
    let specs = with_spinner("Looking up attributes...", appraiser.item_specs(&args.item)).await?;
    for (attribute, options) in specs {
        println!("{attribute}: {}", options.join(", "));
    }
    Ok(())
}

pub async fn appraise(args: AppraiseArgs, config: &Config) -> anyhow::Result<()> {
    let appraiser = build_appraiser(config)?;

    let mut request = AppraisalRequest::new(&args.item);
    for (name, value) in args.specs {
        request = request.with_spec(name, value);
    }
    if let Some(condition) = args.condition {
        request = request.with_condition(condition);
    }
    if let Some(path) = &args.photo {
        request = request.with_photo(load_photo(path, config).await?);
    }

    let record = with_spinner("Appraising...", appraiser.appraise(&request)).await?;
    tracing::info!(
        "Appraised '{}' via {} ({})",
        record.item,
        record.provider,
        record.model
    );

    let format = args
        .format
        .map(CoreOutputFormat::from)
        .or_else(|| CoreOutputFormat::parse(&config.output.format))
        .unwrap_or(CoreOutputFormat::Json);
    let pretty = args.pretty || config.output.pretty;
    write_record(&record, format, pretty, args.output.as_deref())
}

pub async fn hype(args: HypeArgs, config: &Config) -> anyhow::Result<()> {
    let appraiser = build_appraiser(config)?;
    let score = with_spinner("Checking demand...", appraiser.hype_score(&args.item)).await?;
    println!("{score}");
    Ok(())
}

pub async fn imei(args: ImeiArgs, config: &Config) -> anyhow::Result<()> {
    let appraiser = build_appraiser(config)?;
    let photo = load_photo(&args.photo, config).await?;
    let imei = with_spinner("Reading IMEI...", appraiser.read_imei(photo)).await?;
    println!("{imei}");
    Ok(())
}

pub(crate) fn build_appraiser(config: &Config) -> anyhow::Result<Appraiser> {
    Appraiser::from_config(config).context(
        "No usable inference provider. Set GEMINI_API_KEY, GROQ_API_KEY or XAI_API_KEY, \
         or run `genie` for guided setup",
    )
}

/// Read a photo (with `~` expansion) and downscale it per `[photo]`.
pub(crate) async fn load_photo(path: &Path, config: &Config) -> anyhow::Result<ImageInput> {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
    photo::prepare_file(&expanded, &config.photo)
        .await
        .with_context(|| format!("Failed to load photo {}", expanded.display()))
}

fn write_record(
    record: &AppraisalRecord,
    format: CoreOutputFormat,
    pretty: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = OutputWriter::new(BufWriter::new(file), format, pretty);
            writer.write(record)?;
            writer.flush()?;
            tracing::info!("Wrote appraisal to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = OutputWriter::new(stdout.lock(), format, pretty);
            writer.write(record)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Await `future` behind a stderr spinner.
pub(crate) async fn with_spinner<F: Future>(message: &str, future: F) -> F::Output {
    let spinner = create_spinner(message);
    let output = future.await;
    spinner.finish_and_clear();
    output
}

fn create_spinner(message: &str) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

    let spinner = ProgressBar::new_spinner();
    spinner.set_draw_target(ProgressDrawTarget::stderr());
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print a finished appraisal as a human-readable card on stderr.
pub(crate) fn print_record(record: &AppraisalRecord) {
    let cyan = Style::new().for_stderr().cyan();
    let bold = Style::new().for_stderr().bold();
    let dim = Style::new().for_stderr().dim();
    let green = Style::new().for_stderr().green();
    let yellow = Style::new().for_stderr().yellow();

    let result = &record.result;
    eprintln!();
    eprintln!("  {}", bold.apply_to(&result.title));
    eprintln!(
        "  {} {} {} {}",
        cyan.apply_to("Price:"),
        green.apply_to(&result.low_price),
        dim.apply_to("(quick sale) to"),
        green.apply_to(format!("{} (patient)", result.high_price))
    );
    if record.had_photo {
        let verdict = if result.verified {
            green.apply_to("✓ photo matches")
        } else {
            yellow.apply_to("! photo does not match")
        };
        eprintln!("  {verdict} {}", dim.apply_to(&result.note));
    }
    eprintln!();
    for line in result.description.lines() {
        eprintln!("    {line}");
    }
    eprintln!();
    eprintln!(
        "  {}",
        dim.apply_to(format!("via {} ({})", record.provider, record.model))
    );
    eprintln!();
}
