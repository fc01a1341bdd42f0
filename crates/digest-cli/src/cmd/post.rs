use crate::output::{print_documents, print_json};
use crate::settings;
use anyhow::Context;
use chrono::{DateTime, Utc};
use digest_core::config::Credentials;
use digest_core::digest::{build_digest, documents};
use digest_core::linear::LinearClient;
use digest_core::render::render_message;
use digest_core::slack::SlackClient;
use std::path::Path;

pub fn run(
    config_path: Option<&Path>,
    credentials: &Credentials,
    dry_run: bool,
    now: Option<DateTime<Utc>>,
    json: bool,
) -> anyhow::Result<()> {
    credentials.check(!dry_run)?;

    let config = settings::load(config_path)?;
    let tz = config.timezone()?;
    let pattern = config.thread_regex()?;
    let now = now.unwrap_or_else(Utc::now);

    // Progress lines would corrupt JSON output.
    let progress = |line: &str| {
        if !json {
            println!("{line}");
        }
    };

    progress("Fetching Linear issues...");
    let linear = LinearClient::new(credentials.linear_api_key()?, &config.linear_api_url)?;
    let issues = linear
        .fetch_digest_issues(now, tz)
        .context("failed to fetch Linear issues")?;
    tracing::info!("fetched {} issue(s)", issues.len());

    let buckets = build_digest(&issues, now, tz);
    if buckets.is_empty() {
        if json {
            print_json(&serde_json::json!({ "posted": false, "weeks": [] }))?;
        } else {
            println!("No issues to report this week.");
        }
        return Ok(());
    }

    for bucket in &buckets {
        tracing::info!(
            "week of {}: {} issue(s){}",
            bucket.label(),
            bucket.issues.len(),
            if bucket.has_blocked() { ", some blocked" } else { "" }
        );
    }

    let docs = documents(&buckets);
    let message = render_message(&docs, &config.emoji, &config.fallback_text);

    if dry_run {
        if json {
            print_json(&message)?;
        } else {
            println!("Dry Run - Message to be posted:");
            print_documents(&docs);
        }
        return Ok(());
    }

    let channel = credentials.slack_channel()?;
    let slack = SlackClient::new(credentials.slack_token()?, &config.slack_api_url)?;

    progress("Finding weekly message thread...");
    let thread_ts = slack.find_weekly_thread(channel, config.history_limit, &pattern)?;
    if thread_ts.is_none() {
        progress("Could not find weekly message thread; posting to the channel instead.");
    }

    progress("Posting to Slack...");
    let ts = slack.post_message(channel, &message, thread_ts.as_deref())?;

    if json {
        print_json(&serde_json::json!({
            "posted": true,
            "channel": channel,
            "thread_ts": thread_ts,
            "ts": ts,
            "weeks": buckets.iter().map(|b| b.label()).collect::<Vec<_>>(),
        }))?;
    } else {
        println!("Successfully posted update to Slack!");
    }
    Ok(())
}
