use async_trait::async_trait;
use thiserror::Error;
use vigil_types::AlertPayload;

/// A transmission attempt that did not go through. Transient by contract:
/// the same payload may succeed on the next invocation.
#[derive(Debug, Error)]
#[error("transmission failed: {0}")]
pub struct TransportError(pub String);

/// The external channel that physically delivers a notification.
#[async_trait]
pub trait AlertTransport: Send + Sync {
    async fn transmit(&self, payload: &AlertPayload) -> Result<(), TransportError>;
}

/// Fire-and-forget operator alerting for repeated transmission failures.
#[async_trait]
pub trait OperatorEscalator: Send + Sync {
    async fn escalate(&self, message: &str);
}
