use crate::api::{ApiError, FindingsApi, GetFindingsRequest, GetFindingsResponse};

/// Largest page `GetFindings` is asked for.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Page size for a query with an optional row limit.
///
/// Small limits shrink the page so no more rows are fetched than could be
/// returned; the result is never below one.
pub fn page_size_for_limit(limit: Option<i64>) -> i32 {
    match limit {
        Some(limit) if limit < i64::from(DEFAULT_PAGE_SIZE) => limit.max(1) as i32,
        _ => DEFAULT_PAGE_SIZE,
    }
}

enum PageState {
    First,
    Next(String),
    Done,
}

/// Lazy iterator over `GetFindings` pages.
///
/// Each call to `next` performs at most one remote request. Iteration ends
/// after a page without a continuation token or after the first error, and
/// cannot be restarted.
pub struct FindingPages<'a, A: FindingsApi + ?Sized> {
    api: &'a A,
    request: GetFindingsRequest,
    state: PageState,
}

impl<'a, A: FindingsApi + ?Sized> FindingPages<'a, A> {
    pub fn new(api: &'a A, request: GetFindingsRequest) -> Self {
        Self {
            api,
            request,
            state: PageState::First,
        }
    }
}

impl<A: FindingsApi + ?Sized> Iterator for FindingPages<'_, A> {
    type Item = Result<GetFindingsResponse, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.state, PageState::Done) {
            PageState::Done => return None,
            PageState::First => self.request.next_token = None,
            PageState::Next(token) => self.request.next_token = Some(token),
        }

        let page = match self.api.get_findings(&self.request) {
            Ok(page) => page,
            Err(error) => return Some(Err(error)),
        };

        tracing::debug!(
            page_size = self.request.max_results,
            findings = page.findings.len(),
            has_more = page.continuation().is_some(),
            "fetched findings page"
        );

        if let Some(token) = page.continuation() {
            self.state = PageState::Next(token.to_string());
        }
        Some(Ok(page))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::finding::Finding;

    struct ScriptedApi {
        pages: RefCell<Vec<Result<GetFindingsResponse, ApiError>>>,
        tokens_seen: RefCell<Vec<Option<String>>>,
    }

    impl ScriptedApi {
        fn new(pages: Vec<Result<GetFindingsResponse, ApiError>>) -> Self {
            Self {
                pages: RefCell::new(pages.into_iter().rev().collect()),
                tokens_seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl FindingsApi for ScriptedApi {
        fn get_findings(
            &self,
            request: &GetFindingsRequest,
        ) -> Result<GetFindingsResponse, ApiError> {
            self.tokens_seen
                .borrow_mut()
                .push(request.next_token.clone());
            self.pages
                .borrow_mut()
                .pop()
                .expect("no scripted page left")
        }
    }

    fn page(count: usize, token: Option<&str>) -> GetFindingsResponse {
        GetFindingsResponse {
            findings: vec![Finding::default(); count],
            next_token: token.map(str::to_string),
        }
    }

    #[test]
    fn page_size_follows_limit() {
        assert_eq!(page_size_for_limit(None), 100);
        assert_eq!(page_size_for_limit(Some(100)), 100);
        assert_eq!(page_size_for_limit(Some(5_000)), 100);
        assert_eq!(page_size_for_limit(Some(99)), 99);
        assert_eq!(page_size_for_limit(Some(1)), 1);
        assert_eq!(page_size_for_limit(Some(0)), 1);
        assert_eq!(page_size_for_limit(Some(-7)), 1);
    }

    #[test]
    fn follows_continuation_tokens() {
        let api = ScriptedApi::new(vec![
            Ok(page(2, Some("t1"))),
            Ok(page(2, Some("t2"))),
            Ok(page(1, None)),
        ]);

        let sizes: Vec<usize> = FindingPages::new(&api, GetFindingsRequest::default())
            .map(|page| page.expect("page").findings.len())
            .collect();

        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(
            *api.tokens_seen.borrow(),
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[test]
    fn stops_after_error() {
        let api = ScriptedApi::new(vec![
            Ok(page(1, Some("t1"))),
            Err(ApiError::Runtime("boom".to_string())),
        ]);

        let mut pages = FindingPages::new(&api, GetFindingsRequest::default());
        assert!(pages.next().expect("first").is_ok());
        assert!(pages.next().expect("second").is_err());
        assert!(pages.next().is_none());
    }

    #[test]
    fn fetches_lazily() {
        let api = ScriptedApi::new(vec![Ok(page(1, Some("t1"))), Ok(page(1, None))]);

        let mut pages = FindingPages::new(&api, GetFindingsRequest::default());
        assert_eq!(api.tokens_seen.borrow().len(), 0);
        let _ = pages.next();
        assert_eq!(api.tokens_seen.borrow().len(), 1);
    }
}
