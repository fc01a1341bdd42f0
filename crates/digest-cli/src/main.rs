mod cmd;
mod output;
mod settings;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use digest_core::config::Credentials;
use digest_core::week::parse_instant;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "weekly-digest",
    about = "Post a weekly digest of your assigned Linear issues to a Slack thread",
    version,
    propagate_version = true
)]
struct Cli {
    /// Settings file (default: ./weekly-digest.yaml if present)
    #[arg(long, global = true, env = "WEEKLY_DIGEST_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log progress at info level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(flatten)]
    credentials: CredentialArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CredentialArgs {
    /// Linear personal API key
    #[arg(long, global = true, env = "LINEAR_API_KEY", hide_env_values = true)]
    linear_api_key: Option<String>,

    /// Slack bot OAuth token
    #[arg(long, global = true, env = "SLACK_OAUTH_TOKEN", hide_env_values = true)]
    slack_token: Option<String>,

    /// Slack channel to read and post in
    #[arg(long, global = true, env = "SLACK_CHANNEL_ID")]
    slack_channel: Option<String>,
}

impl From<CredentialArgs> for Credentials {
    fn from(args: CredentialArgs) -> Self {
        Credentials {
            linear_api_key: args.linear_api_key,
            slack_token: args.slack_token,
            slack_channel: args.slack_channel,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch issues, render the digest and post it to the weekly thread
    Post {
        /// Print the message instead of posting it
        #[arg(long)]
        dry_run: bool,

        /// Reference time for week boundaries (RFC 3339, default: now)
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
    },

    /// Show which message the digest would be threaded under
    Thread,

    /// Inspect and validate settings
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let credentials = Credentials::from(cli.credentials);
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Post { dry_run, now } => {
            cmd::post::run(config_path, &credentials, dry_run, now, cli.json)
        }
        Commands::Thread => cmd::thread::run(config_path, &credentials, cli.json),
        Commands::Config { subcommand } => {
            cmd::config::run(config_path, &credentials, subcommand, cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
