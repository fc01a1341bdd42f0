use crate::output::print_json;
use crate::settings;
use clap::Subcommand;
use digest_core::config::{
    Credentials, WarnLevel, LINEAR_API_KEY, SLACK_CHANNEL_ID, SLACK_OAUTH_TOKEN,
};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print effective settings and which credentials are present
    Show,

    /// Validate the settings for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    config_path: Option<&Path>,
    credentials: &Credentials,
    subcmd: ConfigSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(config_path, credentials, json),
        ConfigSubcommand::Validate => validate(config_path, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(config_path: Option<&Path>, credentials: &Credentials, json: bool) -> anyhow::Result<()> {
    let config = settings::load(config_path)?;

    let presence = [
        (LINEAR_API_KEY, credentials.linear_api_key().is_ok()),
        (SLACK_OAUTH_TOKEN, credentials.slack_token().is_ok()),
        (SLACK_CHANNEL_ID, credentials.slack_channel().is_ok()),
    ];

    if json {
        let creds: serde_json::Map<String, serde_json::Value> = presence
            .iter()
            .map(|(name, set)| (name.to_string(), serde_json::Value::Bool(*set)))
            .collect();
        return print_json(&serde_json::json!({
            "settings": config,
            "credentials": creds,
        }));
    }

    print!("{}", serde_yaml::to_string(&config)?);
    println!();
    for (name, set) in presence {
        println!("{name}: {}", if set { "set" } else { "missing" });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = settings::load(config_path)?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
