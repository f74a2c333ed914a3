use tclass_core::results::ResultPage;

/// Paginated query-result source. Pages arrive in source order, one pass;
/// the stream is not restartable and a failed page aborts the run.
pub trait QueryResultSource {
    fn for_each_page(
        &self,
        query_execution_id: &str,
        on_page: &mut dyn FnMut(ResultPage) -> Result<(), String>,
    ) -> Result<(), String>;
}
