//! Campaign Dispatcher
//!
//! Resolves a campaign's audience, then walks it strictly sequentially
//! (one message in flight, a fixed pacing interval between sends) as a
//! fire-and-forget background task. The triggering request only gets the
//! recipient count and the `sending` status back.
//!
//! Lifecycle writes go through conditional UPDATEs so two dispatch
//! requests racing on one campaign cannot both enter the send loop.
//!
//! Per-recipient transport failures are recorded on the message row and
//! never abort the loop. A store failure mid-loop aborts the remainder
//! and marks the campaign `failed`; messages already recorded keep their
//! individual outcomes; partial completion is permanent and visible.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use shared::models::{Campaign, CampaignStatus, DispatchAck, Member, TargetType};
use shared::{AppError, AppResult, ErrorCode};

use crate::audit::{AuditAction, AuditService};
use crate::db::repository::{campaign, contact_group, member, message};
use crate::messaging::phone::normalize_phone;
use crate::messaging::segmentation::message_units;
use crate::messaging::transport::SmsTransport;

/// 群发调度器
#[derive(Clone)]
pub struct CampaignDispatcher {
    pool: SqlitePool,
    transport: Arc<dyn SmsTransport>,
    audit: AuditService,
    country_code: String,
    send_interval: Duration,
    /// Cancellation handle per in-flight campaign. The public contract
    /// does not expose mid-flight cancellation; the handle exists so
    /// shutdown (and a future cancel feature) has something to signal.
    handles: Arc<DashMap<i64, CancellationToken>>,
}

impl CampaignDispatcher {
    pub fn new(
        pool: SqlitePool,
        transport: Arc<dyn SmsTransport>,
        audit: AuditService,
        country_code: impl Into<String>,
        send_interval: Duration,
    ) -> Self {
        Self {
            pool,
            transport,
            audit,
            country_code: country_code.into(),
            send_interval,
            handles: Arc::new(DashMap::new()),
        }
    }

    /// 启动群发：同步返回受众规模，发送循环转入后台
    ///
    /// Fails with `CampaignInvalidState` unless the campaign is in
    /// `draft`/`scheduled`, and with `CampaignNoRecipients` before any
    /// state mutation when the audience is empty.
    pub async fn send_campaign(&self, campaign_id: i64) -> AppResult<DispatchAck> {
        let campaign = self.load_campaign(campaign_id).await?;

        if !campaign.status.is_dispatchable() {
            return Err(AppError::with_message(
                ErrorCode::CampaignInvalidState,
                format!(
                    "Campaign {} is {}, expected draft or scheduled",
                    campaign_id, campaign.status
                ),
            ));
        }

        let recipients = self.resolve_recipients(&campaign).await?;
        if recipients.is_empty() {
            return Err(AppError::new(ErrorCode::CampaignNoRecipients));
        }
        let total_recipients = recipients.len() as i64;

        // CAS on the status column closes the check-then-set race between
        // two dispatch requests for the same campaign.
        let now = shared::util::now_millis();
        let won = campaign::try_begin_dispatch(&self.pool, campaign_id, total_recipients, now)
            .await
            .map_err(AppError::from)?;
        if !won {
            return Err(AppError::with_message(
                ErrorCode::CampaignInvalidState,
                format!("Campaign {campaign_id} was already dispatched"),
            ));
        }

        if campaign.target_type == TargetType::SpecificGroup
            && let Some(group_id) = campaign.group_id
        {
            contact_group::touch_last_used(&self.pool, group_id, now)
                .await
                .map_err(AppError::from)?;
        }

        self.audit
            .log(
                AuditAction::CampaignDispatched,
                "campaign",
                campaign_id.to_string(),
                None,
                None,
                serde_json::json!({ "total_recipients": total_recipients }),
            )
            .await;

        let token = CancellationToken::new();
        self.handles.insert(campaign_id, token.clone());

        let dispatcher = self.clone();
        let body = campaign.body.clone();
        tokio::spawn(async move {
            dispatcher
                .run_dispatch(campaign_id, body, recipients, token)
                .await;
        });

        Ok(DispatchAck {
            total_recipients,
            status: CampaignStatus::Sending,
        })
    }

    /// 取消群发：仅 draft/scheduled 状态可取消
    ///
    /// A campaign already `sending` cannot be cancelled through this
    /// contract; the conditional UPDATE refuses it.
    pub async fn cancel_campaign(&self, campaign_id: i64) -> AppResult<Campaign> {
        let campaign = self.load_campaign(campaign_id).await?;

        let now = shared::util::now_millis();
        let cancelled = campaign::try_cancel(&self.pool, campaign_id, now)
            .await
            .map_err(AppError::from)?;
        if !cancelled {
            return Err(AppError::with_message(
                ErrorCode::CampaignInvalidState,
                format!(
                    "Campaign {} is {}, only draft or scheduled campaigns can be cancelled",
                    campaign_id, campaign.status
                ),
            ));
        }

        self.audit
            .log(
                AuditAction::CampaignCancelled,
                "campaign",
                campaign_id.to_string(),
                None,
                None,
                serde_json::json!({}),
            )
            .await;

        self.load_campaign(campaign_id).await
    }

    /// 停机：向所有在途发送循环发出取消信号
    pub fn shutdown(&self) {
        for entry in self.handles.iter() {
            entry.value().cancel();
        }
    }

    /// Whether a send loop is currently registered for the campaign
    pub fn is_dispatching(&self, campaign_id: i64) -> bool {
        self.handles.contains_key(&campaign_id)
    }

    // ── Internal ────────────────────────────────────────────────────

    async fn load_campaign(&self, campaign_id: i64) -> AppResult<Campaign> {
        campaign::find_by_id(&self.pool, campaign_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::CampaignNotFound,
                    format!("Campaign {campaign_id} not found"),
                )
            })
    }

    /// Resolve the audience in stable order: active members with a phone
    /// number, optionally restricted to an active group membership.
    async fn resolve_recipients(&self, campaign: &Campaign) -> AppResult<Vec<Member>> {
        match campaign.target_type {
            TargetType::AllMembers => member::find_recipients_all(&self.pool)
                .await
                .map_err(AppError::from),
            TargetType::SpecificGroup => {
                let group_id = campaign.group_id.ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::CampaignTargetInvalid,
                        "specific_group campaign has no group_id",
                    )
                })?;
                contact_group::find_by_id(&self.pool, group_id)
                    .await
                    .map_err(AppError::from)?
                    .ok_or_else(|| {
                        AppError::with_message(
                            ErrorCode::GroupNotFound,
                            format!("Contact group {group_id} not found"),
                        )
                    })?;
                member::find_recipients_by_group(&self.pool, group_id)
                    .await
                    .map_err(AppError::from)
            }
            TargetType::CustomList => Err(AppError::with_message(
                ErrorCode::CampaignTargetInvalid,
                "custom_list campaigns carry no stored audience",
            )),
        }
    }

    /// The background send loop. Consumes the already-resolved audience;
    /// campaign state has been CAS-ed to `sending` before this runs.
    async fn run_dispatch(
        &self,
        campaign_id: i64,
        body: String,
        recipients: Vec<Member>,
        token: CancellationToken,
    ) {
        tracing::info!(
            campaign_id,
            recipients = recipients.len(),
            interval_ms = self.send_interval.as_millis() as u64,
            "Campaign dispatch started"
        );

        let mut sent_count: i64 = 0;
        let mut failed_count: i64 = 0;
        let mut aborted = false;

        // Fixed-interval ticker: first tick fires immediately, each
        // subsequent recipient waits out the pacing gap. Virtual time in
        // tests drives this without wall-clock delays.
        let mut ticker = tokio::time::interval(self.send_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for recipient in &recipients {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::warn!(campaign_id, "Dispatch loop cancelled before completion");
                    aborted = true;
                    break;
                }
                _ = ticker.tick() => {}
            }

            match self
                .send_to_recipient(campaign_id, &body, recipient)
                .await
            {
                Ok(true) => sent_count += 1,
                Ok(false) => failed_count += 1,
                Err(e) => {
                    // Store failure: abort the remainder, keep what is
                    // already recorded.
                    tracing::error!(
                        campaign_id,
                        member_id = recipient.id,
                        error = %e,
                        "Dispatch loop aborted by store failure"
                    );
                    aborted = true;
                    break;
                }
            }
        }

        let status = if aborted {
            CampaignStatus::Failed
        } else {
            CampaignStatus::Completed
        };

        let now = shared::util::now_millis();
        if let Err(e) =
            campaign::finish_dispatch(&self.pool, campaign_id, status, sent_count, failed_count, now)
                .await
        {
            tracing::error!(campaign_id, error = %e, "Failed to persist campaign outcome");
        }

        self.audit
            .log(
                if aborted {
                    AuditAction::CampaignFailed
                } else {
                    AuditAction::CampaignCompleted
                },
                "campaign",
                campaign_id.to_string(),
                None,
                None,
                serde_json::json!({ "sent": sent_count, "failed": failed_count }),
            )
            .await;

        self.handles.remove(&campaign_id);

        tracing::info!(
            campaign_id,
            status = %status,
            sent = sent_count,
            failed = failed_count,
            "Campaign dispatch finished"
        );
    }

    /// Send one message. `Ok(true)` = delivered, `Ok(false)` = recorded
    /// failure (bad number or transport rejection), `Err` = store failure.
    async fn send_to_recipient(
        &self,
        campaign_id: i64,
        body: &str,
        recipient: &Member,
    ) -> AppResult<bool> {
        let raw_phone = recipient.phone.as_deref().unwrap_or_default();
        let units = message_units(body);
        let now = shared::util::now_millis();

        let Some(phone) = normalize_phone(raw_phone, &self.country_code) else {
            let message_id = message::create_pending(
                &self.pool,
                Some(campaign_id),
                Some(recipient.id),
                raw_phone,
                body,
                units,
                now,
            )
            .await
            .map_err(AppError::from)?;
            message::mark_failed(
                &self.pool,
                message_id,
                "phone number cannot be normalized",
                shared::util::now_millis(),
            )
            .await
            .map_err(AppError::from)?;
            return Ok(false);
        };

        let message_id = message::create_pending(
            &self.pool,
            Some(campaign_id),
            Some(recipient.id),
            &phone,
            body,
            units,
            now,
        )
        .await
        .map_err(AppError::from)?;

        match self.transport.send(&phone, body).await {
            Ok(receipt) => {
                message::mark_sent(
                    &self.pool,
                    message_id,
                    &receipt.provider_id,
                    shared::util::now_millis(),
                )
                .await
                .map_err(AppError::from)?;
                Ok(true)
            }
            Err(e) => {
                // Recorded, not raised; the loop carries on.
                tracing::warn!(
                    campaign_id,
                    member_id = recipient.id,
                    error = %e,
                    "Message transport failure"
                );
                message::mark_failed(
                    &self.pool,
                    message_id,
                    &e.to_string(),
                    shared::util::now_millis(),
                )
                .await
                .map_err(AppError::from)?;
                Ok(false)
            }
        }
    }
}
