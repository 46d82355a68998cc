use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("document code is empty")]
    EmptyCode,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("verification form not found on {url}")]
    FormNotFound { url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("lookup exceeded its {budget_secs}s deadline")]
    DeadlineExceeded { budget_secs: u64 },
}
