/// Management-API surface for one account/region scope.
///
/// Errors from either call are the per-row recoverable kind: the caller
/// captures the message and moves on to the next row.
pub trait TableClassApi {
    fn describe_table_class(&self, table_name: &str) -> Result<String, String>;

    /// Applies the new class and returns the resulting table status.
    fn update_table_class(&self, table_name: &str, table_class: &str) -> Result<String, String>;
}

/// Exchanges an account/region pair for a scoped management-API client.
///
/// One credential exchange per distinct (account, region) group, never per
/// row. Failure is fatal for the run; clients must not outlive it.
pub trait TableApiBroker {
    fn client_for(&self, account_id: &str, region: &str) -> Result<Box<dyn TableClassApi>, String>;
}
