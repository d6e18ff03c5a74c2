//! Blast endpoints.

use serde_json::{Map, Value};
use st_core::error::StResult;

use crate::client::ApiClient;
use crate::response::ApiResponse;

impl ApiClient {
    /// Get information about a blast.
    pub async fn get_blast(&self, blast_id: &str) -> StResult<ApiResponse> {
        let mut data = Map::new();
        data.insert("blast_id".into(), Value::String(blast_id.to_string()));
        self.api_get("blast", data).await
    }
}
