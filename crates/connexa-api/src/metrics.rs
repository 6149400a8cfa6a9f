// Application metrics summary under `/metrics`.

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::MetricsResponse;

impl ApiClient {
    /// `GET /metrics/`: node totals computed live by the server.
    pub async fn metrics(&self) -> Result<MetricsResponse, Error> {
        self.get("metrics/").await
    }
}
