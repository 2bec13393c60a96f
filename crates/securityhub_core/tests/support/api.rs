use std::cell::RefCell;
use std::collections::VecDeque;

use securityhub_core::api::{ApiError, FindingsApi, GetFindingsRequest, GetFindingsResponse};

/// Scripted `FindingsApi` that replays queued responses and records every
/// request it receives.
#[derive(Default)]
pub struct FakeFindingsApi {
    responses: RefCell<VecDeque<Result<GetFindingsResponse, ApiError>>>,
    requests: RefCell<Vec<GetFindingsRequest>>,
}

impl FakeFindingsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page: GetFindingsResponse) -> Self {
        self.responses.borrow_mut().push_back(Ok(page));
        self
    }

    pub fn with_error(self, error: ApiError) -> Self {
        self.responses.borrow_mut().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<GetFindingsRequest> {
        self.requests.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl FindingsApi for FakeFindingsApi {
    fn get_findings(&self, request: &GetFindingsRequest) -> Result<GetFindingsResponse, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(GetFindingsResponse::default()))
    }
}

pub fn not_subscribed_error() -> ApiError {
    ApiError::Service {
        status: 401,
        code: "InvalidAccessException".to_string(),
        message: "Account 123456789012 is not subscribed to AWS Security Hub".to_string(),
    }
}

pub fn throttling_error() -> ApiError {
    ApiError::Service {
        status: 429,
        code: "TooManyRequestsException".to_string(),
        message: "Rate exceeded".to_string(),
    }
}
