//! Send endpoints.

use serde_json::{Map, Value};
use st_core::error::StResult;

use crate::client::ApiClient;
use crate::response::ApiResponse;

fn send_params(send_id: &str) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("send_id".into(), Value::String(send_id.to_string()));
    data
}

impl ApiClient {
    /// Get the status of a send.
    pub async fn get_send(&self, send_id: &str) -> StResult<ApiResponse> {
        self.api_get("send", send_params(send_id)).await
    }

    /// Cancel a send that was scheduled for a future time.
    pub async fn cancel_send(&self, send_id: &str) -> StResult<ApiResponse> {
        self.api_delete("send", send_params(send_id)).await
    }
}
