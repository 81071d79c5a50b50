use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "repo2resume")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Turn your GitHub contributions into resume-ready summaries",
    long_about = "repo2resume collects your commits and pull requests from a GitHub repository \
                  and asks a language model to write resume-style bullet points about them. \
                  Run `serve` for the HTTP API, `ui` for the terminal client, or `generate` \
                  for a one-shot summary."
)]
pub struct Cli {
    /// Path to config file (default: ~/.config/repo2resume/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:8000
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Open the terminal client
    Ui {
        /// Base URL of the API
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },

    /// Generate a summary once and print it as Markdown
    Generate {
        /// Repository as owner/name
        #[arg(short, long)]
        repo: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// End date (YYYY-MM-DD), inclusive
        #[arg(long)]
        until: Option<String>,

        /// Comma-separated pull request numbers to highlight
        #[arg(long, value_delimiter = ',')]
        priority: Vec<u64>,

        /// Instructions replacing the default prompt header
        #[arg(long)]
        prompt: Option<String>,

        /// Output file path (markdown format)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Config,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Commands::Generate { repo, prompt, .. } = &self.command {
            if repo.trim().is_empty() {
                return Err("--repo must not be empty".to_string());
            }
            if prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err("--prompt must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Default `tracing` filter for the verbosity level
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "repo2resume=info,tower_http=info",
            1 => "repo2resume=debug,tower_http=debug",
            _ => "repo2resume=trace,tower_http=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_serve() {
        let cli = Cli::parse_from(vec!["repo2resume", "serve", "--bind", "0.0.0.0:9000"]);
        assert!(matches!(
            cli.command,
            Commands::Serve { bind: Some(ref b) } if b == "0.0.0.0:9000"
        ));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_generate_with_options() {
        let cli = Cli::parse_from(vec![
            "repo2resume",
            "generate",
            "--repo",
            "acme/widgets",
            "--since",
            "2024-01-01",
            "--priority",
            "42,7",
            "--output",
            "summary.md",
        ]);
        let Commands::Generate {
            repo,
            since,
            until,
            priority,
            output,
            ..
        } = cli.command
        else {
            panic!("expected generate");
        };
        assert_eq!(repo, "acme/widgets");
        assert_eq!(since.as_deref(), Some("2024-01-01"));
        assert!(until.is_none());
        assert_eq!(priority, vec![42, 7]);
        assert!(output.is_some());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(vec!["repo2resume", "ui", "-vv", "--config", "c.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(cli.log_filter().contains("trace"));
    }

    #[test]
    fn test_cli_init_command() {
        let cli = Cli::parse_from(vec!["repo2resume", "init"]);
        assert!(matches!(cli.command, Commands::Init { force: false }));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(vec!["repo2resume"]).is_err());
    }

    #[test]
    fn test_cli_validation_empty_prompt() {
        let cli = Cli::parse_from(vec![
            "repo2resume",
            "generate",
            "--repo",
            "acme/widgets",
            "--prompt",
            "  ",
        ]);
        assert!(cli.validate().is_err());
    }
}
