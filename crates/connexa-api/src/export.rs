// Export token endpoints under `/export`.

use url::Url;

use crate::client::{ApiClient, encode};
use crate::error::Error;
use crate::types::{
    CreateTokenRequest, CreatedTokenResponse, ExportTokenResponse, MessageResponse,
    TokenListResponse,
};

/// Download formats served by `/export/download/{format}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Txt, Self::Csv, Self::Json];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl ApiClient {
    /// `GET /export/tokens`
    pub async fn list_export_tokens(&self) -> Result<Vec<ExportTokenResponse>, Error> {
        let resp: TokenListResponse = self.get("export/tokens").await?;
        Ok(resp.tokens)
    }

    /// `POST /export/tokens`. The raw token appears only in this response.
    pub async fn create_export_token(
        &self,
        description: Option<&str>,
    ) -> Result<CreatedTokenResponse, Error> {
        let body = encode(&CreateTokenRequest {
            description: description.map(str::to_owned),
        })?;
        self.post("export/tokens", Some(&body)).await
    }

    /// `DELETE /export/tokens/{id}`
    pub async fn revoke_export_token(&self, id: i64) -> Result<MessageResponse, Error> {
        self.delete(&format!("export/tokens/{id}")).await
    }

    /// Download link for a freshly created token. Needs no admin session.
    pub fn export_download_url(&self, format: ExportFormat, token: &str) -> Result<Url, Error> {
        let mut url = self.url(&format!("export/download/{}", format.as_str()))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}
