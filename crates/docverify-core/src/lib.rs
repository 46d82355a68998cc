mod app_config;
mod config;
pub mod profile;

pub use app_config::{AppConfig, Environment, DEFAULT_PORTAL_URL, DEFAULT_USER_AGENT};
pub use config::{load_app_config, load_app_config_from_env};
pub use profile::PortalProfile;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
