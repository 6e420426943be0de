use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::time::Duration;

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:4173,http://127.0.0.1:4173,http://localhost:5173,http://127.0.0.1:5173";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub environment: String,
    pub stripe_api_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_api_base: String,
    pub admin_api_key: String,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub webhook_tolerance_secs: i64,
}

fn required(key: &str) -> anyhow::Result<String> {
    let value = env::var(key).with_context(|| format!("{key} must be set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("{key} must not be empty");
    }
    Ok(value)
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let stripe_api_key = required("STRIPE_API_KEY")?;
        // Empty means every webhook is rejected.
        let stripe_webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default();
        let stripe_api_base =
            env::var("STRIPE_API_BASE").unwrap_or_else(|_| "https://api.stripe.com".into());
        let admin_api_key = required("ADMIN_API_KEY")?;
        let allowed_origins = split_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.into()),
        );
        Ok(Self {
            server_port,
            database_url,
            environment,
            stripe_api_key,
            stripe_webhook_secret,
            stripe_api_base,
            admin_api_key,
            allowed_origins,
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS", 30)?,
            webhook_tolerance_secs: parsed("WEBHOOK_TOLERANCE_SECS", 300)?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            split_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(split_origins(DEFAULT_ORIGINS).len(), 5);
    }
}
