//! SigV4-signed `GetFindings` client.
//!
//! The core crate's [`FindingsApi`] is synchronous, so the client bridges
//! into async `reqwest`/`aws-config` either through its own current-thread
//! runtime (CLI) or through the ambient multi-thread runtime (Lambda).
//! Credentials are resolved once and reused until they near expiry, and
//! transient failures are retried according to a [`RetryPolicy`].

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningParams, SigningSettings};
use aws_sigv4::sign::v4;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Deserialize;

use securityhub_core::api::{ApiError, FindingsApi, GetFindingsRequest, GetFindingsResponse};

use crate::config::{AdapterConfig, ConfigError};
use crate::retry::RetryPolicy;

const SERVICE_NAME: &str = "securityhub";
const FINDINGS_PATH: &str = "/findings";
const JSON_CONTENT_TYPE: &str = "application/json";
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Cached credentials are refreshed this long before they expire.
const CREDENTIAL_REFRESH_WINDOW: Duration = Duration::from_secs(300);

enum RuntimeBridge {
    Owned(tokio::runtime::Runtime),
    Ambient(tokio::runtime::Handle),
}

impl RuntimeBridge {
    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match self {
            RuntimeBridge::Owned(runtime) => runtime.block_on(future),
            RuntimeBridge::Ambient(handle) => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
        }
    }
}

/// Credentials resolved from a provider, reused until close to expiry.
struct CredentialCache {
    provider: SharedCredentialsProvider,
    cached: Mutex<Option<Credentials>>,
}

impl CredentialCache {
    fn new(provider: SharedCredentialsProvider) -> Self {
        Self {
            provider,
            cached: Mutex::new(None),
        }
    }

    async fn credentials(&self) -> Result<Credentials, ApiError> {
        if let Some(credentials) = self.fresh(SystemTime::now()) {
            return Ok(credentials);
        }

        let credentials = self
            .provider
            .provide_credentials()
            .await
            .map_err(|error| ApiError::Credentials(error.to_string()))?;
        tracing::debug!(expiry = ?credentials.expiry(), "resolved aws credentials");

        if let Ok(mut cached) = self.cached.lock() {
            *cached = Some(credentials.clone());
        }
        Ok(credentials)
    }

    fn fresh(&self, now: SystemTime) -> Option<Credentials> {
        let cached = self.cached.lock().ok()?;
        cached
            .as_ref()
            .filter(|credentials| !expires_soon(credentials, now))
            .cloned()
    }
}

fn expires_soon(credentials: &Credentials, now: SystemTime) -> bool {
    credentials
        .expiry()
        .is_some_and(|expiry| expiry <= now + CREDENTIAL_REFRESH_WINDOW)
}

/// Security Hub `GetFindings` over HTTPS.
pub struct SecurityHubClient {
    bridge: RuntimeBridge,
    http: reqwest::Client,
    credentials: CredentialCache,
    retry: RetryPolicy,
    region: String,
    endpoint: String,
}

impl SecurityHubClient {
    /// Build a client with its own runtime, resolving region and credentials
    /// through the AWS default chain.
    pub fn connect(config: &AdapterConfig) -> Result<Self, ApiError> {
        let runtime = owned_runtime()?;
        let sdk_config = runtime.block_on(load_sdk_config(config.region.clone()));
        Self::from_parts(RuntimeBridge::Owned(runtime), &sdk_config, config)
    }

    /// Build a client that runs on the current multi-thread tokio runtime.
    pub async fn load(config: &AdapterConfig) -> Result<Self, ApiError> {
        let sdk_config = load_sdk_config(config.region.clone()).await;
        let handle = tokio::runtime::Handle::current();
        Self::from_parts(RuntimeBridge::Ambient(handle), &sdk_config, config)
    }

    /// Build a client with explicit credentials and an owned runtime.
    pub fn with_credentials(
        region: &str,
        config: &AdapterConfig,
        credentials: SharedCredentialsProvider,
    ) -> Result<Self, ApiError> {
        let endpoint = config.resolve_endpoint(region).map_err(config_error)?;
        Ok(Self {
            bridge: RuntimeBridge::Owned(owned_runtime()?),
            http: http_client()?,
            credentials: CredentialCache::new(credentials),
            retry: RetryPolicy::default(),
            region: region.to_string(),
            endpoint,
        })
    }

    fn from_parts(
        bridge: RuntimeBridge,
        sdk_config: &SdkConfig,
        config: &AdapterConfig,
    ) -> Result<Self, ApiError> {
        let region = sdk_config
            .region()
            .map(ToString::to_string)
            .ok_or_else(|| config_error(ConfigError::MissingRegion))?;
        let credentials = sdk_config
            .credentials_provider()
            .ok_or_else(|| config_error(ConfigError::MissingCredentials))?;
        let endpoint = config.resolve_endpoint(&region).map_err(config_error)?;

        tracing::debug!(%region, %endpoint, "security hub client ready");

        Ok(Self {
            bridge,
            http: http_client()?,
            credentials: CredentialCache::new(credentials),
            retry: RetryPolicy::default(),
            region,
            endpoint,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_with_retry(&self, body: &[u8]) -> Result<GetFindingsResponse, ApiError> {
        let mut attempt = 1;
        loop {
            match self.send(body).await {
                Err(error) if self.retry.should_retry(attempt, &error) => {
                    let delay = self.retry.delay_for(attempt - 1);
                    tracing::warn!(attempt, ?delay, %error, "retrying GetFindings");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn send(&self, body: &[u8]) -> Result<GetFindingsResponse, ApiError> {
        let credentials = self.credentials.credentials().await?;

        let url = format!("{}{}", self.endpoint, FINDINGS_PATH);
        let headers = signing_headers(&url, body, credentials, &self.region, SystemTime::now())?;

        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .body(body.to_vec())
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let error_type = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(service_error(status.as_u16(), error_type.as_deref(), &bytes));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl FindingsApi for SecurityHubClient {
    fn get_findings(&self, request: &GetFindingsRequest) -> Result<GetFindingsResponse, ApiError> {
        let body = serde_json::to_vec(request)?;
        self.bridge.block_on(self.send_with_retry(&body))
    }
}

async fn load_sdk_config(region: Option<String>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region));
    }
    loader.load().await
}

fn owned_runtime() -> Result<tokio::runtime::Runtime, ApiError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ApiError::Runtime(error.to_string()))
}

fn http_client() -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(transport_error)
}

fn transport_error(error: reqwest::Error) -> ApiError {
    ApiError::Transport(Box::new(error))
}

fn config_error(error: ConfigError) -> ApiError {
    ApiError::Config(error.to_string())
}

fn signing_error(error: impl std::fmt::Display) -> ApiError {
    ApiError::Signing(error.to_string())
}

/// Headers that authenticate a `POST` of `body` to `url`.
pub(crate) fn signing_headers(
    url: &str,
    body: &[u8],
    credentials: Credentials,
    region: &str,
    time: SystemTime,
) -> Result<Vec<(String, String)>, ApiError> {
    let parsed = Url::parse(url).map_err(signing_error)?;
    let host = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => return Err(signing_error(format!("no host in {url}"))),
    };

    let identity = credentials.into();
    let params: SigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name(SERVICE_NAME)
        .time(time)
        .settings(SigningSettings::default())
        .build()
        .map_err(signing_error)?
        .into();

    let signed_headers = [("host", host.as_str()), ("content-type", JSON_CONTENT_TYPE)];
    let signable = SignableRequest::new(
        "POST",
        url,
        signed_headers.into_iter(),
        SignableBody::Bytes(body),
    )
    .map_err(signing_error)?;

    let (instructions, _signature) = sign(signable, &params).map_err(signing_error)?.into_parts();
    let (headers, _query) = instructions.into_parts();
    Ok(headers
        .into_iter()
        .map(|header| (header.name().to_string(), header.value().to_string()))
        .collect())
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "Message")]
    message: Option<String>,
    #[serde(default, alias = "Code")]
    code: Option<String>,
    #[serde(default, rename = "__type")]
    type_name: Option<String>,
}

/// Decode a non-2xx response into [`ApiError::Service`].
pub(crate) fn service_error(status: u16, error_type: Option<&str>, body: &[u8]) -> ApiError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();

    let code = error_type
        .and_then(|raw| raw.split(':').next())
        .map(str::to_string)
        .or(parsed.code)
        .or_else(|| {
            parsed
                .type_name
                .as_deref()
                .and_then(|raw| raw.rsplit('#').next())
                .map(str::to_string)
        })
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| "UnknownError".to_string());

    let message = parsed.message.unwrap_or_else(|| {
        let text = String::from_utf8_lossy(body).trim().to_string();
        if text.is_empty() {
            format!("HTTP {status}")
        } else {
            text
        }
    });

    ApiError::Service {
        status,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn signs_with_scope_for_service_and_region() {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
        let time = UNIX_EPOCH + Duration::from_secs(1_709_251_200);

        let headers = signing_headers(
            "https://securityhub.us-east-1.amazonaws.com/findings",
            b"{}",
            credentials,
            "us-east-1",
            time,
        )
        .expect("signing should succeed");

        let authorization = header(&headers, "authorization").expect("authorization header");
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240301/us-east-1/securityhub/aws4_request"
        ));
        assert!(authorization.contains("SignedHeaders="));
        assert_eq!(header(&headers, "x-amz-date"), Some("20240301T000000Z"));
        assert!(header(&headers, "x-amz-security-token").is_none());
    }

    #[test]
    fn session_token_is_forwarded() {
        let credentials = Credentials::new(
            "AKIDEXAMPLE",
            "secret",
            Some("session".to_string()),
            None,
            "test",
        );

        let headers = signing_headers(
            "http://localhost:4566/findings",
            b"{}",
            credentials,
            "us-east-1",
            SystemTime::now(),
        )
        .expect("signing should succeed");

        assert_eq!(header(&headers, "x-amz-security-token"), Some("session"));
    }

    #[test]
    fn service_error_prefers_error_type_header() {
        let error = service_error(
            401,
            Some("InvalidAccessException:http://internal.amazon.com/coral/"),
            br#"{"Code":"Other","Message":"Account 123 is not subscribed to AWS Security Hub"}"#,
        );

        match &error {
            ApiError::Service { status, code, .. } => {
                assert_eq!(*status, 401);
                assert_eq!(code, "InvalidAccessException");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(error.is_not_subscribed());
    }

    #[test]
    fn service_error_falls_back_to_body_type() {
        let error = service_error(
            400,
            None,
            br#"{"__type":"com.amazonaws.securityhub#InvalidInputException","message":"bad"}"#,
        );

        assert_eq!(
            error.to_string(),
            "InvalidInputException: bad (status 400)"
        );
    }

    #[test]
    fn credentials_without_expiry_never_go_stale() {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
        assert!(!expires_soon(&credentials, SystemTime::now()));
    }

    #[test]
    fn credentials_are_refreshed_ahead_of_expiry() {
        let now = UNIX_EPOCH + Duration::from_secs(1_709_251_200);
        let expiring = |seconds| {
            Credentials::new(
                "AKIDEXAMPLE",
                "secret",
                Some("session".to_string()),
                Some(now + Duration::from_secs(seconds)),
                "test",
            )
        };

        assert!(expires_soon(&expiring(60), now));
        assert!(expires_soon(&expiring(300), now));
        assert!(!expires_soon(&expiring(3_600), now));
    }

    #[test]
    fn service_error_handles_non_json_body() {
        let error = service_error(503, None, b"");
        assert_eq!(error.to_string(), "UnknownError: HTTP 503 (status 503)");
    }
}
