use crate::output::print_json;
use crate::settings;
use digest_core::config::Credentials;
use digest_core::slack::SlackClient;
use std::path::Path;

pub fn run(
    config_path: Option<&Path>,
    credentials: &Credentials,
    json: bool,
) -> anyhow::Result<()> {
    credentials.check_slack()?;
    let channel = credentials.slack_channel()?;
    let token = credentials.slack_token()?;

    let config = settings::load(config_path)?;
    let pattern = config.thread_regex()?;
    let slack = SlackClient::new(token, &config.slack_api_url)?;
    let thread_ts = slack.find_weekly_thread(channel, config.history_limit, &pattern)?;

    if json {
        return print_json(&serde_json::json!({
            "channel": channel,
            "pattern": config.thread_pattern,
            "thread_ts": thread_ts,
        }));
    }

    match thread_ts {
        Some(ts) => println!("{ts}"),
        None => println!(
            "Could not find weekly message thread in the last {} messages",
            config.history_limit
        ),
    }
    Ok(())
}
