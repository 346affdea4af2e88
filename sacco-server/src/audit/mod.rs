//! 审计日志模块 — 防篡改审计追踪
//!
//! # 架构
//!
//! ```text
//! 敏感操作触发
//!   └─ AuditService::log() → mpsc → AuditWorker → SQLite (audit_log 表)
//!
//! SHA256 哈希链: genesis → entry₁ → entry₂ → ... → entryₙ
//! ```
//!
//! # 防篡改保证
//!
//! - **SHA256 哈希链**: 每条记录包含前一条的哈希
//! - **Append-only**: 无删除/更新接口
//! - **链验证 API**: 可随时验证完整性

pub mod service;
pub mod storage;
pub mod types;
pub mod worker;

pub use service::{AuditLogRequest, AuditService};
pub use storage::AuditStorage;
pub use types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditListResponse, AuditQuery,
};
pub use worker::AuditWorker;
