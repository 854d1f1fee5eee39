use crate::error::BackendError;
use crate::runtime::contract::{QueryRequest, QueryResult, QueryState, ResultRow};

/// Asynchronous SQL execution keyed by execution id.
pub trait QueryService {
    fn start_query(&self, request: &QueryRequest) -> Result<String, BackendError>;

    fn query_state(&self, execution_id: &str) -> Result<QueryState, BackendError>;

    /// Returns every result row, header first, across all result pages.
    fn query_results(&self, execution_id: &str) -> Result<QueryResult, BackendError>;
}

/// One page of result rows plus the continuation token for the next page.
pub type ResultPage = (Vec<ResultRow>, Option<String>);

/// Follows continuation tokens until the service reports no further page.
///
/// `fetch_page` receives `None` for the first page. Rows are appended in
/// page order; only the first page carries the header row.
pub fn collect_pages<F>(mut fetch_page: F) -> Result<QueryResult, BackendError>
where
    F: FnMut(Option<String>) -> Result<ResultPage, BackendError>,
{
    let mut result = QueryResult::empty();
    let mut next_token = None;

    loop {
        let (rows, token) = fetch_page(next_token.take())?;
        result.extend(rows);
        match token {
            Some(token) => next_token = Some(token),
            None => return Ok(result),
        }
    }
}
