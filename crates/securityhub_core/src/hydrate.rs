use crate::api::{ApiError, FindingsApi, GetFindingsRequest};
use crate::filters::build_finding_filters;
use crate::finding::Finding;
use crate::pagination::{page_size_for_limit, FindingPages};
use crate::query::QueryContext;

/// Receiver for findings streamed by [`list_findings`].
pub trait FindingSink {
    fn push_finding(&mut self, finding: Finding);

    /// Rows the caller still wants; `None` when unbounded. Listing stops as
    /// soon as this reaches zero, which also covers caller cancellation.
    fn rows_remaining(&self) -> Option<u64>;
}

impl FindingSink for Vec<Finding> {
    fn push_finding(&mut self, finding: Finding) {
        self.push(finding);
    }

    fn rows_remaining(&self) -> Option<u64> {
        None
    }
}

/// Fetch a single finding by identifier.
///
/// An empty identifier or an account without Security Hub yields `Ok(None)`.
pub fn get_finding<A: FindingsApi + ?Sized>(
    api: &A,
    id: &str,
) -> Result<Option<Finding>, ApiError> {
    tracing::trace!(id, "get_finding");

    if id.is_empty() {
        return Ok(None);
    }

    match api.get_findings(&GetFindingsRequest::for_id(id)) {
        Ok(response) => Ok(response.findings.into_iter().next()),
        Err(error) => {
            tracing::debug!(id, %error, "get_finding failed");
            if error.is_not_subscribed() {
                return Ok(None);
            }
            Err(error)
        }
    }
}

/// Stream every finding matching the query into `sink`.
///
/// Pages are fetched lazily and pagination stops once the sink reports no
/// remaining rows. An account without Security Hub produces no rows and no
/// error.
pub fn list_findings<A: FindingsApi + ?Sized>(
    api: &A,
    ctx: &QueryContext,
    sink: &mut dyn FindingSink,
) -> Result<(), ApiError> {
    tracing::trace!(limit = ?ctx.limit, "list_findings");

    let filters = build_finding_filters(&ctx.quals);
    let request = GetFindingsRequest {
        filters: (!filters.is_empty()).then_some(filters),
        max_results: Some(page_size_for_limit(ctx.limit)),
        next_token: None,
    };

    match stream_pages(api, request, sink) {
        Ok(()) => Ok(()),
        Err(error) => {
            tracing::error!(%error, "list_findings failed");
            if error.is_not_subscribed() {
                return Ok(());
            }
            Err(error)
        }
    }
}

fn stream_pages<A: FindingsApi + ?Sized>(
    api: &A,
    request: GetFindingsRequest,
    sink: &mut dyn FindingSink,
) -> Result<(), ApiError> {
    for page in FindingPages::new(api, request) {
        for finding in page?.findings {
            sink.push_finding(finding);
            if sink.rows_remaining() == Some(0) {
                return Ok(());
            }
        }
    }
    Ok(())
}
