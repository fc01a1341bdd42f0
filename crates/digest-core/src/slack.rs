use crate::error::{DigestError, Result};
use crate::render::SlackMessage;
use crate::thread::{find_thread, ChannelMessage};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<ChannelMessage>,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

#[derive(Debug, Serialize)]
struct PostRequest<'a> {
    channel: &'a str,
    #[serde(flatten)]
    message: &'a SlackMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// SlackClient
// ---------------------------------------------------------------------------

/// Minimal Slack Web API client: channel history and message posting.
pub struct SlackClient {
    http: Client,
    base_url: String,
}

impl SlackClient {
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token.trim())).map_err(|_| {
            DigestError::InvalidConfig("SLACK_OAUTH_TOKEN is not a valid header".into())
        })?;
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// Most recent messages in `channel`, newest first.
    pub fn history(&self, channel: &str, limit: u32) -> Result<Vec<ChannelMessage>> {
        let response: HistoryResponse = self
            .http
            .get(self.endpoint("conversations.history"))
            .query(&[("channel", channel), ("limit", &limit.to_string())])
            .send()?
            .json()?;

        if !response.ok {
            return Err(DigestError::History(
                response.error.unwrap_or_else(|| "unknown_error".into()),
            ));
        }
        tracing::debug!("fetched {} message(s) from {channel}", response.messages.len());
        Ok(response.messages)
    }

    /// Scan recent history for the weekly thread parent.
    pub fn find_weekly_thread(
        &self,
        channel: &str,
        limit: u32,
        pattern: &Regex,
    ) -> Result<Option<String>> {
        let messages = self.history(channel, limit)?;
        Ok(find_thread(&messages, pattern))
    }

    /// Post `message`, as a reply when `thread_ts` is given. Returns the
    /// posted message's `ts` when Slack reports one.
    pub fn post_message(
        &self,
        channel: &str,
        message: &SlackMessage,
        thread_ts: Option<&str>,
    ) -> Result<Option<String>> {
        let request = PostRequest {
            channel,
            message,
            thread_ts,
        };
        let response: PostResponse = self
            .http
            .post(self.endpoint("chat.postMessage"))
            .json(&request)
            .send()?
            .json()?;

        if !response.ok {
            return Err(DigestError::Post(
                response.error.unwrap_or_else(|| "unknown_error".into()),
            ));
        }
        tracing::info!("posted to {channel}");
        Ok(response.ts)
    }
}
