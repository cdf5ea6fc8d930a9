//! Genie CLI - price and list second-hand items from the terminal.
//!
//! Describe an item, optionally photograph it, and Genie asks a chain of
//! vision LLMs (Gemini, then Groq, then Grok) for a price range and a
//! ready-to-post listing.
//!
//! # Usage
//!
//! ```bash
//! # Guided flow (search → specs → condition → photo → result)
//! genie
//!
//! # One-shot appraisal
//! genie appraise --item "iPhone 13" --spec Storage=128GB --condition used --photo phone.jpg
//!
//! # Demand score and IMEI lookup
//! genie hype --item "PS5 Slim"
//! genie imei settings-screen.png
//! ```

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::process::ExitCode;

mod cli;
mod logging;

/// Genie - AI price estimates and listings for marketplace sellers.
#[derive(Parser, Debug)]
#[command(name = "genie")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Suggest specific models for a vague item description
    Suggest(cli::appraise::SuggestArgs),

    /// List the attributes that matter for an item's price
    Specs(cli::appraise::SpecsArgs),

    /// Price an item and draft a listing
    Appraise(cli::appraise::AppraiseArgs),

    /// Rate current buyer demand for an item (1-10)
    Hype(cli::appraise::HypeArgs),

    /// Read a phone's IMEI from a photo
    Imei(cli::appraise::ImeiArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match genie_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `genie config path`."
            );
            genie_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Genie v{}", genie_core::VERSION);

    let result = match cli.command {
        Some(Commands::Suggest(args)) => cli::appraise::suggest(args, &config).await,
        Some(Commands::Specs(args)) => cli::appraise::specs(args, &config).await,
        Some(Commands::Appraise(args)) => cli::appraise::appraise(args, &config).await,
        Some(Commands::Hype(args)) => cli::appraise::hype(args, &config).await,
        Some(Commands::Imei(args)) => cli::appraise::imei(args, &config).await,
        Some(Commands::Config(args)) => cli::config::execute(args).await,
        None if std::io::stdin().is_terminal() => cli::interactive::run(config).await,
        None => Err(anyhow::anyhow!(
            "No command given and stdin is not a terminal. Run `genie --help` for usage."
        )),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let red = console::Style::new().for_stderr().red();
            eprintln!("{} {e:#}", red.apply_to("✗"));
            ExitCode::FAILURE
        }
    }
}
