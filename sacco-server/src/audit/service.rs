//! 审计日志服务
//!
//! 敏感操作通过 mpsc 通道异步写入，不阻塞请求路径。
//! 通道满或已关闭时降级为 tracing 告警，业务流程不受影响。

use tokio::sync::mpsc;

use super::types::AuditAction;

/// 一条待写入的审计请求
#[derive(Debug)]
pub struct AuditLogRequest {
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: Option<i64>,
    pub operator_name: Option<String>,
    pub details: serde_json::Value,
}

/// 审计日志服务（发送端）
#[derive(Clone)]
pub struct AuditService {
    tx: mpsc::Sender<AuditLogRequest>,
}

impl AuditService {
    /// 创建服务与后台 worker 的消费端
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// 记录一条审计日志（尽力而为，不阻塞）
    pub async fn log(
        &self,
        action: AuditAction,
        resource_type: &str,
        resource_id: impl Into<String>,
        operator_id: Option<i64>,
        operator_name: Option<String>,
        details: serde_json::Value,
    ) {
        let request = AuditLogRequest {
            action,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.into(),
            operator_id,
            operator_name,
            details,
        };

        if let Err(e) = self.tx.try_send(request) {
            tracing::warn!(error = %e, "Audit log channel unavailable, entry dropped");
        }
    }
}
