use crate::error::Result;
use async_trait::async_trait;
use qualstat_protocol::ServicePayload;

/// The external numeric computation service that runs the actual test.
///
/// Implementations return the service's response body as JSON. A body that
/// arrives as a JSON string holding the encoded object is fine: the
/// dispatcher decodes it.
#[async_trait]
pub trait NumericService: Send + Sync {
    async fn compute(&self, payload: &ServicePayload) -> Result<serde_json::Value>;
}
