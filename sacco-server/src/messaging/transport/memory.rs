//! In-memory SMS transport
//!
//! Records every send instead of talking to a gateway. Used by tests and
//! by local development when no provider is configured. Failures can be
//! scripted per phone number.

use super::{SendReceipt, SmsTransport, TransportError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// A message captured by the in-memory transport
#[derive(Debug, Clone)]
pub struct RecordedSms {
    pub phone: String,
    pub body: String,
    pub provider_id: String,
}

/// In-memory transport; cheap to clone behind an `Arc`
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<RecordedSms>>,
    fail_numbers: Mutex<HashSet<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a per-recipient failure: every send to `phone` is rejected
    pub fn fail_for(&self, phone: impl Into<String>) {
        self.fail_numbers.lock().unwrap().insert(phone.into());
    }

    /// Snapshot of everything sent so far
    pub fn sent(&self) -> Vec<RecordedSms> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl SmsTransport for MemoryTransport {
    async fn send(&self, phone: &str, body: &str) -> Result<SendReceipt, TransportError> {
        if self.fail_numbers.lock().unwrap().contains(phone) {
            return Err(TransportError::Rejected(format!(
                "recipient {phone} unreachable"
            )));
        }

        let receipt = SendReceipt {
            provider_id: uuid::Uuid::new_v4().to_string(),
        };
        self.sent.lock().unwrap().push(RecordedSms {
            phone: phone.to_string(),
            body: body.to_string(),
            provider_id: receipt.provider_id.clone(),
        });
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_sent_messages() {
        let transport = MemoryTransport::new();
        let receipt = transport.send("254700000001", "hello").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].phone, "254700000001");
        assert_eq!(sent[0].body, "hello");
        assert_eq!(sent[0].provider_id, receipt.provider_id);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let transport = MemoryTransport::new();
        transport.fail_for("254700000002");

        let err = transport.send("254700000002", "hello").await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected(_)));
        assert_eq!(transport.sent_count(), 0);
    }
}
