//! 短信传输抽象
//!
//! The dispatcher talks to an [`SmsTransport`]: one request per message,
//! no batching. Concrete gateway integrations plug in behind this trait;
//! the in-tree [`MemoryTransport`] backs tests and local development.

pub mod memory;

pub use memory::MemoryTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Receipt returned by a successful send
#[derive(Debug, Clone)]
pub struct SendReceipt {
    /// Provider-assigned tracking id
    pub provider_id: String,
}

/// Per-message transport failure. Recorded on the message row by the
/// dispatcher; never escalated into a loop abort.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("provider rejected message: {0}")]
    Rejected(String),

    #[error("network failure: {0}")]
    Network(String),
}

/// One-message-at-a-time SMS transport
#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// Send `body` to the normalized international `phone` number
    async fn send(&self, phone: &str, body: &str) -> Result<SendReceipt, TransportError>;
}
