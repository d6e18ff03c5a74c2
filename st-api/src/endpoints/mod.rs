//! API resource methods used by the core.
//!
//! Only the lookups the postback verifier depends on live here. Other
//! resources are reached through `api_get` / `api_post` / `api_delete`
//! with a hand-built parameter set.

pub mod blast;
pub mod send;

use async_trait::async_trait;
use serde_json::Value;

use st_core::error::StResult;

use crate::client::ApiClient;
use crate::postback::ResourceLookup;

#[async_trait]
impl ResourceLookup for ApiClient {
    async fn get_send(&self, send_id: &str) -> StResult<Value> {
        ApiClient::get_send(self, send_id).await.map(|r| r.into_body())
    }

    async fn get_blast(&self, blast_id: &str) -> StResult<Value> {
        ApiClient::get_blast(self, blast_id).await.map(|r| r.into_body())
    }
}
