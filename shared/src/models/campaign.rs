//! Campaign Model

use serde::{Deserialize, Serialize};

/// Campaign lifecycle status
///
/// `draft → scheduled → sending → completed | cancelled | failed`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Completed,
    Cancelled,
    Failed,
}

impl CampaignStatus {
    /// Whether a campaign in this state may be handed to the dispatcher
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, Self::Draft | Self::Scheduled)
    }

    /// Wire/storage spelling of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Sending => "sending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Campaign audience specification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum TargetType {
    AllMembers,
    SpecificGroup,
    CustomList,
}

/// Bulk-messaging campaign entity (群发任务)
///
/// Aggregate counters (`total_recipients`, `sent_count`, `failed_count`)
/// are owned exclusively by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    /// Message body sent to every recipient
    pub body: String,
    pub target_type: TargetType,
    /// Required when `target_type = specific_group`
    pub group_id: Option<i64>,
    pub status: CampaignStatus,
    pub total_recipients: i64,
    pub sent_count: i64,
    pub failed_count: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create campaign payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignCreate {
    pub name: String,
    pub body: String,
    pub target_type: TargetType,
    pub group_id: Option<i64>,
}

/// Update campaign payload (draft campaigns only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub name: Option<String>,
    pub body: Option<String>,
    pub target_type: Option<TargetType>,
    pub group_id: Option<i64>,
}

/// Synchronous acknowledgment returned by the dispatch request; the send
/// loop itself runs in the background after this is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchAck {
    pub total_recipients: i64,
    pub status: CampaignStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CampaignStatus::Sending).unwrap(),
            "\"sending\""
        );
        assert_eq!(
            serde_json::to_string(&TargetType::AllMembers).unwrap(),
            "\"all_members\""
        );
    }

    #[test]
    fn test_dispatchable_states() {
        assert!(CampaignStatus::Draft.is_dispatchable());
        assert!(CampaignStatus::Scheduled.is_dispatchable());
        assert!(!CampaignStatus::Sending.is_dispatchable());
        assert!(!CampaignStatus::Completed.is_dispatchable());
        assert!(!CampaignStatus::Cancelled.is_dispatchable());
        assert!(!CampaignStatus::Failed.is_dispatchable());
    }
}
