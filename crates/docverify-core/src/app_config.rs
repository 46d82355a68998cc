use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Verification page of the document portal.
pub const DEFAULT_PORTAL_URL: &str = "https://rakez.my.salesforce-sites.com/Auth/VerifyDocument";

/// Desktop browser `User-Agent`; the portal serves a degraded page to bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub portal_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Overall budget for one lookup across bootstrap, all attempts and downloads.
    /// `0` disables the deadline.
    pub lookup_deadline_secs: u64,
    pub max_redirects: usize,
    pub debug_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Returns the lookup budget, or `None` when the deadline is disabled.
    #[must_use]
    pub fn lookup_deadline(&self) -> Option<Duration> {
        (self.lookup_deadline_secs > 0).then(|| Duration::from_secs(self.lookup_deadline_secs))
    }
}
