use reqwest::Url;

pub const REGION_ENV: &str = "SECURITYHUB_REGION";
pub const ENDPOINT_ENV: &str = "SECURITYHUB_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no AWS region configured (set --region, SECURITYHUB_REGION or AWS_REGION)")]
    MissingRegion,
    #[error("no AWS credentials provider configured")]
    MissingCredentials,
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Adapter settings layered over the standard AWS configuration chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Region override; `None` defers to the AWS default chain.
    pub region: Option<String>,
    /// Endpoint override, e.g. a local emulator.
    pub endpoint: Option<String>,
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        Self {
            region: non_empty_env(REGION_ENV),
            endpoint: non_empty_env(ENDPOINT_ENV),
        }
    }

    /// Explicit values win over whatever was loaded before.
    pub fn with_overrides(mut self, region: Option<String>, endpoint: Option<String>) -> Self {
        if region.is_some() {
            self.region = region;
        }
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        self
    }

    /// Base URL for requests in `region`, without a trailing slash.
    pub fn resolve_endpoint(&self, region: &str) -> Result<String, ConfigError> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return Ok(default_endpoint(region));
        };

        let parsed = Url::parse(endpoint).map_err(|error| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: error.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "expected an http(s) URL with a host".to_string(),
            });
        }
        Ok(endpoint.trim_end_matches('/').to_string())
    }
}

pub fn default_endpoint(region: &str) -> String {
    if region.starts_with("cn-") {
        format!("https://securityhub.{region}.amazonaws.com.cn")
    } else {
        format!("https://securityhub.{region}.amazonaws.com")
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
