// Generation Gateway Module
//
// This module provides:
// - GenerationGateway trait, the boundary to the hosted generative AI service
// - Gateway error types
// - GeminiGateway, the REST implementation used by the site

pub mod error;
pub mod gemini;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::{GatewayError, GatewayErrorCode, GatewayResult};
pub use gemini::GeminiGateway;

use crate::models::{GenerationRequest, GenerationResult, OperationHandle, ResultRef};
use crate::utils::config::GatewayConfig;

/// What a submission gives back: the finished result, or a job to poll
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResponse {
    Completed(GenerationResult),
    Pending(OperationHandle),
}

/// Status of a long-running operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationStatus {
    pub done: bool,
    pub result_ref: Option<ResultRef>,
    /// Provider-side failure reported on a finished operation
    pub error: Option<String>,
}

impl OperationStatus {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn finished(result_ref: ResultRef) -> Self {
        Self {
            done: true,
            result_ref: Some(result_ref),
            error: None,
        }
    }
}

/// Trait for generation gateways
/// Implemented by the hosted service client and by test doubles
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Get the gateway name
    fn name(&self) -> &str;

    /// Submit a request. Short kinds complete inline, long-running kinds
    /// return an operation handle.
    async fn generate_content(&self, request: &GenerationRequest)
        -> GatewayResult<GatewayResponse>;

    /// Query a long-running operation
    async fn get_operation_status(&self, handle: &OperationHandle)
        -> GatewayResult<OperationStatus>;

    /// Fetch the final bytes behind a result reference
    async fn resolve_result(&self, result_ref: &ResultRef) -> GatewayResult<Vec<u8>>;
}

/// Shared gateway type, one instance per session
pub type SharedGateway = Arc<dyn GenerationGateway>;

/// Factory function to create the hosted gateway
///
/// # Arguments
/// * `config` - Endpoint and model settings
/// * `api_key` - The studio key
pub fn create_gateway(config: GatewayConfig, api_key: Option<String>) -> GatewayResult<SharedGateway> {
    let key = api_key.ok_or(GatewayError::MissingCredential)?;
    if key.trim().is_empty() {
        return Err(GatewayError::MissingCredential);
    }
    if config.endpoint.trim().is_empty() {
        return Err(GatewayError::InvalidConfig(
            "Gateway endpoint cannot be empty".to_string(),
        ));
    }
    Ok(Arc::new(GeminiGateway::new(config, key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gateway_with_key() {
        let gateway = create_gateway(GatewayConfig::default(), Some("studio-key".to_string()));
        assert!(gateway.is_ok());
        assert_eq!(gateway.unwrap().name(), "Gemini");
    }

    #[test]
    fn test_create_gateway_without_key() {
        let result = create_gateway(GatewayConfig::default(), None);
        assert!(matches!(result, Err(GatewayError::MissingCredential)));

        let result = create_gateway(GatewayConfig::default(), Some("  ".to_string()));
        assert!(matches!(result, Err(GatewayError::MissingCredential)));
    }

    #[test]
    fn test_create_gateway_with_blank_endpoint() {
        let config = GatewayConfig {
            endpoint: String::new(),
            ..Default::default()
        };
        let result = create_gateway(config, Some("studio-key".to_string()));
        assert!(matches!(result, Err(GatewayError::InvalidConfig(_))));
    }

    #[test]
    fn test_operation_status_constructors() {
        assert!(!OperationStatus::pending().done);
        let finished = OperationStatus::finished(ResultRef("https://cdn/video.mp4".to_string()));
        assert!(finished.done);
        assert!(finished.result_ref.is_some());
    }
}
