//! Message Model

use serde::{Deserialize, Serialize};

/// Delivery status of one outbound message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

/// One outbound message instance (短信记录)
///
/// Owned by the dispatcher while sending; read-only history afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Message {
    pub id: i64,
    pub campaign_id: Option<i64>,
    pub member_id: Option<i64>,
    /// Normalized international phone number
    pub phone: String,
    pub body: String,
    /// Billable segments under the 160/70 rule
    pub units: i64,
    pub status: MessageStatus,
    /// Provider-assigned tracking id (present once sent)
    pub provider_id: Option<String>,
    /// Transport error text (present once failed)
    pub error: Option<String>,
    pub sent_at: Option<i64>,
    pub failed_at: Option<i64>,
    pub created_at: i64,
}
