use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use aws_credential_types::provider::{future, ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use mockito::Matcher;
use securityhub_aws::client::SecurityHubClient;
use securityhub_aws::config::AdapterConfig;
use securityhub_aws::retry::RetryPolicy;
use serde_json::{json, Value};

pub const REGION: &str = "us-east-1";
pub const ACCESS_KEY: &str = "AKIDEXAMPLE";

/// Credentials provider that counts how often it is asked to resolve.
#[derive(Debug, Clone, Default)]
pub struct CountingProvider {
    calls: Arc<AtomicUsize>,
    expiry: Option<SystemTime>,
}

impl CountingProvider {
    /// Credentials that expire after `ttl`.
    pub fn expiring_in(ttl: Duration) -> Self {
        Self {
            calls: Arc::default(),
            expiry: Some(SystemTime::now() + ttl),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProvideCredentials for CountingProvider {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        future::ProvideCredentials::ready(Ok(Credentials::new(
            ACCESS_KEY,
            "secret",
            None,
            self.expiry,
            "counting",
        )))
    }
}

pub fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

pub fn client_for(endpoint: &str, provider: &CountingProvider) -> SecurityHubClient {
    let config = AdapterConfig {
        region: None,
        endpoint: Some(endpoint.to_string()),
    };
    SecurityHubClient::with_credentials(
        REGION,
        &config,
        SharedCredentialsProvider::new(provider.clone()),
    )
    .expect("client should build")
    .with_retry_policy(fast_retries())
}

/// `Authorization` header of a request signed for Security Hub in [`REGION`].
pub fn signed_by_test_key() -> Matcher {
    Matcher::Regex(format!(
        r"^AWS4-HMAC-SHA256 Credential={ACCESS_KEY}/\d{{8}}/{REGION}/securityhub/aws4_request, "
    ))
}

pub fn finding(index: usize) -> Value {
    json!({
        "Id": format!(
            "arn:aws:securityhub:{REGION}:123456789012:subscription/cis/v/1.2.0/1.{index}/finding/{index}"
        ),
        "AwsAccountId": "123456789012",
        "Region": REGION,
        "Title": format!("finding {index}"),
        "RecordState": "ACTIVE"
    })
}

pub fn findings_page(indices: std::ops::Range<usize>, next_token: Option<&str>) -> String {
    let findings: Vec<Value> = indices.map(finding).collect();
    match next_token {
        Some(token) => json!({ "Findings": findings, "NextToken": token }),
        None => json!({ "Findings": findings }),
    }
    .to_string()
}

pub fn error_body(message: &str) -> String {
    json!({ "Message": message }).to_string()
}
