use crate::app_config::{AppConfig, Environment, DEFAULT_PORTAL_URL, DEFAULT_USER_AGENT};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("DOCVERIFY_ENV", "development"))?;

    let bind_addr = or_default("DOCVERIFY_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("DOCVERIFY_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("DOCVERIFY_LOG_LEVEL", "info");

    let portal_url = or_default("DOCVERIFY_PORTAL_URL", DEFAULT_PORTAL_URL);
    if !(portal_url.starts_with("http://") || portal_url.starts_with("https://")) {
        return Err(invalid(
            "DOCVERIFY_PORTAL_URL",
            format!("\"{portal_url}\" is not an http(s) URL"),
        ));
    }

    let user_agent = or_default("DOCVERIFY_USER_AGENT", DEFAULT_USER_AGENT);
    let request_timeout_secs = parse_u64("DOCVERIFY_REQUEST_TIMEOUT_SECS", "60")?;
    let connect_timeout_secs = parse_u64("DOCVERIFY_CONNECT_TIMEOUT_SECS", "10")?;
    let lookup_deadline_secs = parse_u64("DOCVERIFY_LOOKUP_DEADLINE_SECS", "180")?;
    let max_redirects = or_default("DOCVERIFY_MAX_REDIRECTS", "5")
        .parse::<usize>()
        .map_err(|e| invalid("DOCVERIFY_MAX_REDIRECTS", e.to_string()))?;
    let debug_dir = lookup("DOCVERIFY_DEBUG_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        portal_url,
        user_agent,
        request_timeout_secs,
        connect_timeout_secs,
        lookup_deadline_secs,
        max_redirects,
        debug_dir,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DOCVERIFY_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
