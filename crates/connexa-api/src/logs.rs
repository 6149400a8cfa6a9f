// Audit log endpoint.

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::{AuditEntryResponse, LogListResponse};

impl ApiClient {
    /// `GET /logs?limit={n}`, newest first.
    pub async fn list_logs(&self, limit: u32) -> Result<Vec<AuditEntryResponse>, Error> {
        let resp: LogListResponse = self.get(&format!("logs?limit={limit}")).await?;
        Ok(resp.logs)
    }
}
