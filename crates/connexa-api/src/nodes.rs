// Node pool endpoints under `/nodes`.

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::{MessageResponse, NodeListResponse, NodeResponse, StatsResponse};

impl ApiClient {
    /// `GET /nodes/`
    pub async fn list_nodes(&self) -> Result<Vec<NodeResponse>, Error> {
        let resp: NodeListResponse = self.get("nodes/").await?;
        Ok(resp.nodes)
    }

    /// `GET /nodes/{id}`
    pub async fn get_node(&self, node_id: &str) -> Result<NodeResponse, Error> {
        self.get(&format!("nodes/{}", path_segment(node_id))).await
    }

    /// `GET /nodes/stats/summary`
    pub async fn node_stats(&self) -> Result<StatsResponse, Error> {
        self.get("nodes/stats/summary").await
    }

    /// `POST /nodes/rotate`: new circuits on every node.
    pub async fn rotate_all_nodes(&self) -> Result<MessageResponse, Error> {
        self.post("nodes/rotate", None).await
    }

    /// `POST /nodes/{id}/rotate`
    pub async fn rotate_node(&self, node_id: &str) -> Result<MessageResponse, Error> {
        self.post(&format!("nodes/{}/rotate", path_segment(node_id)), None)
            .await
    }

    /// `POST /nodes/scale?new_size={n}`. Range checks happen before this call.
    pub async fn scale_pool(&self, new_size: u32) -> Result<MessageResponse, Error> {
        self.post(&format!("nodes/scale?new_size={new_size}"), None)
            .await
    }
}

/// Percent-encode a value used as a single path segment.
pub(crate) fn path_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::path_segment;

    #[test]
    fn plain_ids_are_untouched() {
        assert_eq!(path_segment("tor-3"), "tor-3");
        assert_eq!(path_segment("10.0.0.1"), "10.0.0.1");
    }

    #[test]
    fn separators_are_escaped() {
        assert_eq!(path_segment("a/b"), "a%2Fb");
        assert_eq!(path_segment("a b"), "a%20b");
        assert_eq!(path_segment("fe80::1"), "fe80%3A%3A1");
    }
}
