use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 5;
const PUBLIC_API_BASE_URL: &str = "https://api.pipedrive.com/v1";

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub http_addr: String,
    pub chat_webhook_url: Option<String>,
    pub crm_api_token: Option<String>,
    pub crm_domain: Option<String>,
    pub crm_api_base_url: String,
    pub webhook_secret: Option<String>,
    pub require_signature: bool,
    pub crm_timeout: Duration,
    pub dispatch_timeout: Duration,
}

impl RelayConfig {
    pub fn from_env(default_http_addr: &str) -> Result<Self> {
        Self::from_lookup(default_http_addr, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; empty values count as
    /// unset.
    pub fn from_lookup<F>(default_http_addr: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let http_addr = match (var("HTTP_ADDR"), var("PORT")) {
            (Some(addr), _) => addr,
            (None, Some(port)) => {
                let port: u16 = port.parse().context("PORT must be a valid port number")?;
                format!("0.0.0.0:{port}")
            }
            (None, None) => default_http_addr.to_string(),
        };

        let crm_domain = var("PIPEDRIVE_COMPANY_DOMAIN").map(|domain| normalize_domain(&domain));
        let crm_api_base_url = var("PIPEDRIVE_API_BASE_URL")
            .or_else(|| {
                crm_domain
                    .as_deref()
                    .map(|domain| format!("https://{domain}.pipedrive.com/api/v1"))
            })
            .unwrap_or_else(|| PUBLIC_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let require_signature = match var("WEBHOOK_REQUIRE_SIGNATURE") {
            Some(raw) => parse_flag(&raw).context("WEBHOOK_REQUIRE_SIGNATURE must be true or false")?,
            None => false,
        };

        Ok(Self {
            http_addr,
            chat_webhook_url: var("DISCORD_WEBHOOK_URL"),
            crm_api_token: var("PIPEDRIVE_API_TOKEN"),
            crm_domain,
            crm_api_base_url,
            webhook_secret: var("WEBHOOK_SECRET"),
            require_signature,
            crm_timeout: seconds(var("CRM_TIMEOUT_SECS"), "CRM_TIMEOUT_SECS")?,
            dispatch_timeout: seconds(var("DISPATCH_TIMEOUT_SECS"), "DISPATCH_TIMEOUT_SECS")?,
        })
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.crm_api_token.is_some()
    }
}

/// Reduces `https://acme.pipedrive.com/` or `acme.pipedrive.com` to `acme`.
fn normalize_domain(value: &str) -> String {
    let value = value.trim().to_ascii_lowercase();
    let value = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(&value);
    let value = value.trim_end_matches('/');
    value
        .strip_suffix(".pipedrive.com")
        .unwrap_or(value)
        .to_string()
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognized flag value {other:?}"),
    }
}

fn seconds(raw: Option<String>, key: &str) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    if secs == 0 {
        anyhow::bail!("{key} must be greater than zero");
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<RelayConfig> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        RelayConfig::from_lookup("0.0.0.0:3000", |key| values.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();

        assert_eq!(config.http_addr, "0.0.0.0:3000");
        assert_eq!(config.chat_webhook_url, None);
        assert_eq!(config.crm_api_base_url, PUBLIC_API_BASE_URL);
        assert!(!config.require_signature);
        assert!(!config.enrichment_enabled());
        assert_eq!(config.crm_timeout, Duration::from_secs(5));
        assert_eq!(config.dispatch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn port_applies_only_without_http_addr() {
        assert_eq!(config(&[("PORT", "8081")]).unwrap().http_addr, "0.0.0.0:8081");
        assert_eq!(
            config(&[("PORT", "8081"), ("HTTP_ADDR", "127.0.0.1:9000")])
                .unwrap()
                .http_addr,
            "127.0.0.1:9000"
        );
        assert!(config(&[("PORT", "eighty")]).is_err());
    }

    #[test]
    fn domain_drives_api_host_and_is_normalized() {
        let config = config(&[
            ("PIPEDRIVE_COMPANY_DOMAIN", "https://Acme.pipedrive.com/"),
            ("PIPEDRIVE_API_TOKEN", "token"),
        ])
        .unwrap();

        assert_eq!(config.crm_domain.as_deref(), Some("acme"));
        assert_eq!(config.crm_api_base_url, "https://acme.pipedrive.com/api/v1");
        assert!(config.enrichment_enabled());
    }

    #[test]
    fn explicit_api_base_url_wins() {
        let config = config(&[
            ("PIPEDRIVE_COMPANY_DOMAIN", "acme"),
            ("PIPEDRIVE_API_BASE_URL", "http://127.0.0.1:4000/v1/"),
        ])
        .unwrap();

        assert_eq!(config.crm_api_base_url, "http://127.0.0.1:4000/v1");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config(&[("WEBHOOK_SECRET", "  "), ("DISCORD_WEBHOOK_URL", "")]).unwrap();

        assert_eq!(config.webhook_secret, None);
        assert_eq!(config.chat_webhook_url, None);
    }

    #[test]
    fn rejects_bad_flags_and_timeouts() {
        assert!(config(&[("WEBHOOK_REQUIRE_SIGNATURE", "maybe")]).is_err());
        assert!(config(&[("CRM_TIMEOUT_SECS", "0")]).is_err());
        assert!(config(&[("DISPATCH_TIMEOUT_SECS", "-1")]).is_err());

        let strict = config(&[("WEBHOOK_REQUIRE_SIGNATURE", "TRUE"), ("CRM_TIMEOUT_SECS", "2")])
            .unwrap();
        assert!(strict.require_signature);
        assert_eq!(strict.crm_timeout, Duration::from_secs(2));
    }
}
