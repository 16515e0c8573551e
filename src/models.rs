use serde::{Deserialize, Serialize};

/// Body of the cache health endpoint, for both the UP and DOWN cases
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CacheHealthResponse {
    pub redis_connected: bool,
    /// `-1` when the key count could not be read
    pub total_keys: i64,
    /// `UP` or `DOWN`
    pub status: String,
}
