//! Campaign dispatcher integration tests
//!
//! Real SQLite in a temp directory, in-memory transport, and a 2ms pacing
//! interval so the sequential loop finishes quickly while still going
//! through the interval ticker.

use std::sync::Arc;
use std::time::Duration;

use sacco_server::audit::AuditService;
use sacco_server::db::DbService;
use sacco_server::db::repository::{campaign, contact_group, member, message};
use sacco_server::messaging::CampaignDispatcher;
use sacco_server::messaging::transport::MemoryTransport;
use shared::ErrorCode;
use shared::models::{
    CampaignCreate, CampaignStatus, ContactGroupCreate, MemberCreate, MessageStatus, TargetType,
};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::sync::mpsc;

struct Harness {
    _dir: TempDir,
    pool: SqlitePool,
    transport: Arc<MemoryTransport>,
    dispatcher: CampaignDispatcher,
    _audit_rx: mpsc::Receiver<sacco_server::audit::AuditLogRequest>,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.db");
    let db = DbService::new(path.to_str().unwrap())
        .await
        .expect("test database");
    let pool = db.pool;

    let (audit, audit_rx) = AuditService::channel(64);
    let transport = Arc::new(MemoryTransport::new());
    let dispatcher = CampaignDispatcher::new(
        pool.clone(),
        transport.clone(),
        audit,
        "254",
        Duration::from_millis(2),
    );

    Harness {
        _dir: dir,
        pool,
        transport,
        dispatcher,
        _audit_rx: audit_rx,
    }
}

async fn make_member(pool: &SqlitePool, member_no: &str, phone: Option<&str>) -> i64 {
    let created = member::create(
        pool,
        MemberCreate {
            member_no: member_no.to_string(),
            name: format!("Member {member_no}"),
            phone: phone.map(|p| p.to_string()),
            email: None,
            notes: None,
        },
    )
    .await
    .expect("create member");
    created.id
}

async fn make_campaign(pool: &SqlitePool, target_type: TargetType, group_id: Option<i64>) -> i64 {
    let created = campaign::create(
        pool,
        CampaignCreate {
            name: "August savings drive".to_string(),
            body: "Dear member, your August statement is ready.".to_string(),
            target_type,
            group_id,
        },
        None,
    )
    .await
    .expect("create campaign");
    created.id
}

/// Poll until the campaign leaves `sending` (or was never in it)
async fn wait_for_terminal(pool: &SqlitePool, id: i64) -> shared::models::Campaign {
    for _ in 0..500 {
        let c = campaign::find_by_id(pool, id).await.unwrap().unwrap();
        if c.status != CampaignStatus::Sending {
            return c;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("campaign {id} did not reach a terminal status");
}

// ========== Recipient resolution ==========

#[tokio::test]
async fn all_members_targets_active_members_with_phones() {
    let h = harness().await;

    make_member(&h.pool, "M001", Some("0700000001")).await;
    make_member(&h.pool, "M002", Some("0700000002")).await;
    make_member(&h.pool, "M003", Some("0700000003")).await;
    // No phone on file: not a recipient
    make_member(&h.pool, "M004", None).await;
    // Inactive: not a recipient
    let inactive = make_member(&h.pool, "M005", Some("0700000005")).await;
    member::delete(&h.pool, inactive).await.unwrap();

    let campaign_id = make_campaign(&h.pool, TargetType::AllMembers, None).await;
    let ack = h.dispatcher.send_campaign(campaign_id).await.unwrap();
    assert_eq!(ack.total_recipients, 3);
    assert_eq!(ack.status, CampaignStatus::Sending);

    let done = wait_for_terminal(&h.pool, campaign_id).await;
    assert_eq!(done.status, CampaignStatus::Completed);
    assert_eq!(done.total_recipients, 3);
    assert_eq!(done.sent_count + done.failed_count, 3);
    assert_eq!(done.sent_count, 3);
    assert!(done.started_at.is_some());
    assert!(done.completed_at.is_some());

    assert_eq!(h.transport.sent_count(), 3);
}

#[tokio::test]
async fn specific_group_targets_active_memberships_only() {
    let h = harness().await;

    let m1 = make_member(&h.pool, "M001", Some("0700000001")).await;
    let m2 = make_member(&h.pool, "M002", Some("0700000002")).await;
    // In the directory but not in the group
    make_member(&h.pool, "M003", Some("0700000003")).await;

    let group = contact_group::create(
        &h.pool,
        ContactGroupCreate {
            name: "Delinquent borrowers".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();
    contact_group::add_members(&h.pool, group.id, &[m1, m2]).await.unwrap();
    // Removed membership no longer counts
    contact_group::remove_member(&h.pool, group.id, m2).await.unwrap();

    let campaign_id = make_campaign(&h.pool, TargetType::SpecificGroup, Some(group.id)).await;
    let ack = h.dispatcher.send_campaign(campaign_id).await.unwrap();
    assert_eq!(ack.total_recipients, 1);

    let done = wait_for_terminal(&h.pool, campaign_id).await;
    assert_eq!(done.sent_count, 1);

    // Dispatch stamps the group's last_used_at
    let group = contact_group::find_by_id(&h.pool, group.id).await.unwrap().unwrap();
    assert!(group.last_used_at.is_some());
}

#[tokio::test]
async fn empty_group_fails_before_any_state_mutation() {
    let h = harness().await;

    let group = contact_group::create(
        &h.pool,
        ContactGroupCreate {
            name: "Empty group".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    let campaign_id = make_campaign(&h.pool, TargetType::SpecificGroup, Some(group.id)).await;
    let err = h.dispatcher.send_campaign(campaign_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CampaignNoRecipients);

    // No state mutation: still draft, nothing recorded
    let unchanged = campaign::find_by_id(&h.pool, campaign_id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, CampaignStatus::Draft);
    assert!(unchanged.started_at.is_none());
    assert!(message::find_by_campaign(&h.pool, campaign_id).await.unwrap().is_empty());
}

// ========== Lifecycle preconditions ==========

#[tokio::test]
async fn completed_campaign_cannot_be_dispatched_again() {
    let h = harness().await;

    make_member(&h.pool, "M001", Some("0700000001")).await;
    let campaign_id = make_campaign(&h.pool, TargetType::AllMembers, None).await;

    h.dispatcher.send_campaign(campaign_id).await.unwrap();
    wait_for_terminal(&h.pool, campaign_id).await;
    let messages_after_first = message::find_by_campaign(&h.pool, campaign_id).await.unwrap().len();

    let err = h.dispatcher.send_campaign(campaign_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CampaignInvalidState);

    // No new message rows from the refused dispatch
    let messages = message::find_by_campaign(&h.pool, campaign_id).await.unwrap();
    assert_eq!(messages.len(), messages_after_first);
}

#[tokio::test]
async fn concurrent_dispatch_loses_the_status_cas() {
    let h = harness().await;

    make_member(&h.pool, "M001", Some("0700000001")).await;
    let campaign_id = make_campaign(&h.pool, TargetType::AllMembers, None).await;

    // Both calls resolve recipients against a draft campaign; the
    // conditional UPDATE lets only one of them transition to sending.
    let (first, second) = tokio::join!(
        h.dispatcher.send_campaign(campaign_id),
        h.dispatcher.send_campaign(campaign_id),
    );
    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one dispatch must win");
    let err = if first.is_err() {
        first.unwrap_err()
    } else {
        second.unwrap_err()
    };
    assert_eq!(err.code, ErrorCode::CampaignInvalidState);

    let done = wait_for_terminal(&h.pool, campaign_id).await;
    assert_eq!(done.sent_count, 1);
    assert_eq!(message::find_by_campaign(&h.pool, campaign_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cancel_only_applies_to_draft_or_scheduled() {
    let h = harness().await;

    make_member(&h.pool, "M001", Some("0700000001")).await;
    let campaign_id = make_campaign(&h.pool, TargetType::AllMembers, None).await;

    let cancelled = h.dispatcher.cancel_campaign(campaign_id).await.unwrap();
    assert_eq!(cancelled.status, CampaignStatus::Cancelled);
    assert!(cancelled.completed_at.is_some());

    // Cancelled campaigns can be neither re-cancelled nor dispatched
    let err = h.dispatcher.cancel_campaign(campaign_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CampaignInvalidState);
    let err = h.dispatcher.send_campaign(campaign_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CampaignInvalidState);
}

#[tokio::test]
async fn missing_campaign_is_not_found() {
    let h = harness().await;
    let err = h.dispatcher.send_campaign(987654).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CampaignNotFound);
}

// ========== Delivery outcomes ==========

#[tokio::test]
async fn transport_failure_is_recorded_and_does_not_abort_the_loop() {
    let h = harness().await;

    make_member(&h.pool, "M001", Some("0700000001")).await;
    let failing = make_member(&h.pool, "M002", Some("0700000002")).await;
    make_member(&h.pool, "M003", Some("0700000003")).await;
    h.transport.fail_for("254700000002");

    let campaign_id = make_campaign(&h.pool, TargetType::AllMembers, None).await;
    h.dispatcher.send_campaign(campaign_id).await.unwrap();

    let done = wait_for_terminal(&h.pool, campaign_id).await;
    assert_eq!(done.status, CampaignStatus::Completed);
    assert_eq!(done.sent_count, 2);
    assert_eq!(done.failed_count, 1);

    let messages = message::find_by_campaign(&h.pool, campaign_id).await.unwrap();
    assert_eq!(messages.len(), 3);

    let failed: Vec<_> = messages
        .iter()
        .filter(|m| m.status == MessageStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].member_id, Some(failing));
    assert!(failed[0].failed_at.is_some());
    assert!(failed[0].error.as_deref().unwrap().contains("unreachable"));
    assert!(failed[0].provider_id.is_none());

    for sent in messages.iter().filter(|m| m.status == MessageStatus::Sent) {
        assert!(sent.provider_id.is_some());
        assert!(sent.sent_at.is_some());
        assert!(sent.error.is_none());
    }
}

#[tokio::test]
async fn phones_are_normalized_before_sending() {
    let h = harness().await;

    make_member(&h.pool, "M001", Some("0712 345 678")).await;
    make_member(&h.pool, "M002", Some("+254 722 000 111")).await;

    let campaign_id = make_campaign(&h.pool, TargetType::AllMembers, None).await;
    h.dispatcher.send_campaign(campaign_id).await.unwrap();
    wait_for_terminal(&h.pool, campaign_id).await;

    let mut phones: Vec<String> = h.transport.sent().into_iter().map(|s| s.phone).collect();
    phones.sort();
    assert_eq!(phones, vec!["254712345678".to_string(), "254722000111".to_string()]);

    // Message rows carry the normalized number too
    let messages = message::find_by_campaign(&h.pool, campaign_id).await.unwrap();
    assert!(messages.iter().all(|m| m.phone.starts_with("254")));
}

#[tokio::test]
async fn recipients_are_processed_in_resolution_order() {
    let h = harness().await;

    make_member(&h.pool, "M001", Some("0700000001")).await;
    make_member(&h.pool, "M002", Some("0700000002")).await;
    make_member(&h.pool, "M003", Some("0700000003")).await;

    let campaign_id = make_campaign(&h.pool, TargetType::AllMembers, None).await;
    h.dispatcher.send_campaign(campaign_id).await.unwrap();
    wait_for_terminal(&h.pool, campaign_id).await;

    // Sequential loop: transport sees recipients in member creation order
    let phones: Vec<String> = h.transport.sent().into_iter().map(|s| s.phone).collect();
    assert_eq!(
        phones,
        vec![
            "254700000001".to_string(),
            "254700000002".to_string(),
            "254700000003".to_string(),
        ]
    );
}

#[tokio::test]
async fn message_units_are_precomputed_on_the_row() {
    let h = harness().await;

    make_member(&h.pool, "M001", Some("0700000001")).await;

    // 200 ASCII chars → 2 billable units
    let created = campaign::create(
        &h.pool,
        CampaignCreate {
            name: "Long notice".to_string(),
            body: "x".repeat(200),
            target_type: TargetType::AllMembers,
            group_id: None,
        },
        None,
    )
    .await
    .unwrap();

    h.dispatcher.send_campaign(created.id).await.unwrap();
    wait_for_terminal(&h.pool, created.id).await;

    let messages = message::find_by_campaign(&h.pool, created.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].units, 2);
}
