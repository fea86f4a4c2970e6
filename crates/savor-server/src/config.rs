use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub jwt_issuer: Option<String>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("SAVOR_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SAVOR_JWT_SECRET is unset or still a placeholder");
        }

        let host = get("SAVOR_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("SAVOR_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("SAVOR_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let timeout_secs: u64 = get("SAVOR_REQUEST_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("SAVOR_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?
            .unwrap_or(10);

        Ok(Self {
            addr,
            db_path: PathBuf::from(get("SAVOR_DB_PATH").unwrap_or_else(|| "savor.db".into())),
            jwt_secret,
            jwt_audience: get("SAVOR_JWT_AUDIENCE").filter(|v| !v.is_empty()),
            jwt_issuer: get("SAVOR_JWT_ISSUER").filter(|v| !v.is_empty()),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("SAVOR_JWT_SECRET", "a-real-secret")]).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.db_path, PathBuf::from("savor.db"));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.jwt_audience.is_none());
    }

    #[test]
    fn placeholder_secret_is_refused() {
        assert!(load(&[]).is_err());
        assert!(load(&[("SAVOR_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("SAVOR_JWT_SECRET", "a-real-secret"),
            ("SAVOR_HOST", "127.0.0.1"),
            ("SAVOR_PORT", "8888"),
            ("SAVOR_REQUEST_TIMEOUT_SECS", "3"),
            ("SAVOR_JWT_AUDIENCE", "savor-web"),
        ])
        .unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:8888");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.jwt_audience.as_deref(), Some("savor-web"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let loaded = load(&[("SAVOR_JWT_SECRET", "s"), ("SAVOR_PORT", "eighty")]);
        assert!(loaded.is_err());
    }
}
