use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long background tasks get to drain on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Root directory of uploaded files, served at `/storage`.
    pub storage_dir: PathBuf,
    /// Base URL of public file links, without a trailing slash.
    pub public_base_url: String,
    /// Built frontend to serve at `/`. Nothing is served when unset.
    pub frontend_dir: Option<PathBuf>,
    /// Backend hostname the service worker must never intercept.
    pub backend_hostname: Option<String>,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `STORAGE_DIR`           | `storage`               |
    /// | `PUBLIC_BASE_URL`       | `http://localhost:3000` |
    /// | `FRONTEND_DIR`          | unset                   |
    /// | `BACKEND_HOSTNAME`      | unset                   |
    ///
    /// # Panics
    ///
    /// On a value that does not parse, so a bad deployment fails at boot.
    pub fn from_env() -> Self {
        let cors_origins = split_origins(
            &non_empty_var("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:5173".into()),
        );
        let public_base_url = non_empty_var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        Self {
            host: non_empty_var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: env_parse("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_parse("SHUTDOWN_TIMEOUT_SECS", 30),
            storage_dir: non_empty_var("STORAGE_DIR")
                .map_or_else(|| PathBuf::from("storage"), PathBuf::from),
            public_base_url,
            frontend_dir: non_empty_var("FRONTEND_DIR").map(PathBuf::from),
            backend_hostname: non_empty_var("BACKEND_HOSTNAME"),
            jwt: JwtConfig::from_env(),
        }
    }
}

/// Trimmed value of `name`, `None` when unset or blank.
pub(crate) fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `name` as `T`, falling back to `default` when unset.
///
/// # Panics
///
/// When the variable is set but does not parse.
pub(crate) fn env_parse<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_var(name) {
        Some(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name}='{raw}' is invalid: {e}")),
        None => default,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            split_origins(" https://app.igreja.org/ ,,http://localhost:5173"),
            vec!["https://app.igreja.org", "http://localhost:5173"]
        );
        assert!(split_origins(" , ").is_empty());
    }

    #[test]
    fn unset_variable_uses_default() {
        assert_eq!(env_parse("KOINONIA_TEST_UNSET_PORT", 8080u16), 8080);
    }
}
