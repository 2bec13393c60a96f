use serde::{Deserialize, Serialize};

use crate::filters::FindingFilters;
use crate::finding::Finding;

/// Marker Security Hub puts in errors for accounts or regions without the
/// service enabled.
pub const NOT_SUBSCRIBED_MARKER: &str = "not subscribed";

/// Body of a `GetFindings` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetFindingsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FindingFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl GetFindingsRequest {
    pub fn for_id(id: &str) -> Self {
        Self {
            filters: Some(FindingFilters::for_id(id)),
            ..Self::default()
        }
    }
}

/// One page of `GetFindings` results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetFindingsResponse {
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub next_token: Option<String>,
}

impl GetFindingsResponse {
    /// Continuation token, treating an empty token as the final page.
    pub fn continuation(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|token| !token.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{code}: {message} (status {status})")]
    Service {
        status: u16,
        code: String,
        message: String,
    },
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to resolve credentials: {0}")]
    Credentials(String),
    #[error("failed to sign request: {0}")]
    Signing(String),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether the failure means Security Hub is not enabled for the
    /// account/region, which callers treat as an empty result.
    pub fn is_not_subscribed(&self) -> bool {
        self.to_string().contains(NOT_SUBSCRIBED_MARKER)
    }
}

/// Remote `GetFindings` operation.
///
/// Implementations are synchronous; a single call returns one page.
pub trait FindingsApi {
    fn get_findings(&self, request: &GetFindingsRequest) -> Result<GetFindingsResponse, ApiError>;
}

impl<T: FindingsApi + ?Sized> FindingsApi for &T {
    fn get_findings(&self, request: &GetFindingsRequest) -> Result<GetFindingsResponse, ApiError> {
        (**self).get_findings(request)
    }
}
