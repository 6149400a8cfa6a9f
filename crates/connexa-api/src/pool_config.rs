// Pool configuration, firewall and whitelist endpoints under `/config`.

use std::net::IpAddr;

use crate::client::{ApiClient, encode};
use crate::error::Error;
use crate::nodes::path_segment;
use crate::types::{
    ConfigResponse, CountriesRequest, MessageResponse, WhitelistEntryRequest, WhitelistResponse,
};

impl ApiClient {
    /// `GET /config/`
    pub async fn get_config(&self) -> Result<ConfigResponse, Error> {
        self.get("config/").await
    }

    /// `POST /config/firewall/apply`
    pub async fn apply_firewall(&self) -> Result<MessageResponse, Error> {
        self.post("config/firewall/apply", None).await
    }

    /// `POST /config/tor/countries`. Codes are sent comma-joined.
    pub async fn set_countries<S: AsRef<str>>(
        &self,
        countries: &[S],
        strict_nodes: bool,
    ) -> Result<MessageResponse, Error> {
        let joined = countries
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        let body = encode(&CountriesRequest {
            countries: joined,
            strict_nodes,
        })?;
        self.post("config/tor/countries", Some(&body)).await
    }

    /// `GET /config/whitelist`
    pub async fn list_whitelist(&self) -> Result<Vec<String>, Error> {
        let resp: WhitelistResponse = self.get("config/whitelist").await?;
        Ok(resp.whitelist)
    }

    /// `POST /config/whitelist`
    pub async fn add_whitelist_entry(&self, ip: IpAddr) -> Result<MessageResponse, Error> {
        let body = encode(&WhitelistEntryRequest { ip: ip.to_string() })?;
        self.post("config/whitelist", Some(&body)).await
    }

    /// `DELETE /config/whitelist/{ip}`
    pub async fn remove_whitelist_entry(&self, ip: IpAddr) -> Result<MessageResponse, Error> {
        self.delete(&format!("config/whitelist/{}", path_segment(&ip.to_string())))
            .await
    }
}
