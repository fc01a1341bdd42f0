use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Linear API returned HTTP {status}: {body}")]
    LinearStatus { status: u16, body: String },

    #[error("Linear API error: {0}")]
    LinearGraphql(String),

    #[error("No user data found from Linear API")]
    NoData,

    #[error("Failed to get channel history: {0}")]
    History(String),

    #[error("Failed to post message to Slack: {0}")]
    Post(String),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;
