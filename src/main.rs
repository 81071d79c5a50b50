mod ai;
mod cli;
mod config;
mod error;
mod github;
mod orchestrator;
mod server;
mod ui;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use server::wire::GenerateSummaryBody;
use server::AppState;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(&cli)?;

    match &cli.command {
        Commands::Init { force } => init_config(cli.config.as_deref(), *force),
        Commands::Config => show_config(cli.config.as_deref()),
        Commands::Serve { bind } => {
            let mut config = load_config(&cli)?;
            if let Some(bind) = bind {
                config.bind_address = bind.clone();
            }
            server::serve(&config).await?;
            Ok(())
        }
        Commands::Ui { api_url } => {
            let config = load_config(&cli)?;
            let api_url = api_url.clone().unwrap_or_else(|| config.api_base_url.clone());
            let timeout = Duration::from_secs(config.request_timeout_secs);
            ui::run(&api_url, timeout).await
        }
        Commands::Generate {
            repo,
            since,
            until,
            priority,
            prompt,
            output,
        } => {
            let config = load_config(&cli)?;
            let body = GenerateSummaryBody {
                repo_name: repo.clone(),
                start_date: since.clone(),
                end_date: until.clone(),
                prioritized_pr_numbers: Some(priority.clone()),
                custom_prompt: prompt.clone(),
            };
            generate(&config, body, output.as_deref()).await
        }
    }
}

/// Set up `tracing`; the terminal UI logs to a file so it doesn't draw over the screen
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    if matches!(cli.command, Commands::Ui { .. }) {
        let path = ui_log_path()?;
        let file = File::options()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn ui_log_path() -> anyhow::Result<PathBuf> {
    let dir = Config::default_cache_dir()?;
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir.join("ui.log"))
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = Config::load_or_create_default(cli.config.as_deref())
        .context("loading configuration")?;
    Ok(config.with_env())
}

async fn generate(config: &Config, body: GenerateSummaryBody, output: Option<&Path>) -> anyhow::Result<()> {
    let request = body.into_request()?;
    let state = AppState::from_config(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!(
        "Summarizing {} ({})...",
        request.repo_name,
        request.date_range.describe()
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = state.orchestrator.generate_summary(&request).await;
    spinner.finish_and_clear();
    let result = result?;

    let markdown = result.to_markdown();
    match output {
        Some(path) => {
            fs::write(path, &markdown).with_context(|| format!("writing {}", path.display()))?;
            println!("✓ Wrote summary to {}", path.display());
        }
        None => println!("{}", markdown),
    }
    Ok(())
}

fn init_config(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::default_config_path()?,
    };

    if config_path.exists() && !force {
        eprintln!("Config file already exists at: {}", config_path.display());
        eprintln!("Use --force to overwrite");
        std::process::exit(1);
    }

    Config::create_default_at(&config_path)?;
    println!("✓ Created config file at: {}", config_path.display());
    println!("\nTo authenticate, either:");
    println!(
        "  1. Set the {} and {} environment variables",
        config::GITHUB_TOKEN_ENV,
        config::OPENAI_API_KEY_ENV
    );
    println!("  2. Add them to the config file:");
    println!("     github_token = \"ghp_YOUR_TOKEN\"");
    println!("     openai_api_key = \"sk-YOUR_KEY\"");
    Ok(())
}

fn show_config(path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load_or_create_default(path)?.with_env();
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("Current configuration:\n");
    println!("{}", toml_str);
    Ok(())
}
