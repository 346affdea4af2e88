//! 审计日志类型定义
//!
//! 所有条目不可变、不可删除，支持 SHA256 哈希链防篡改。

use serde::{Deserialize, Serialize};

/// 审计操作类型（枚举，非自由文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 系统生命周期 ═══
    /// 系统正常启动
    SystemStartup,
    /// 系统正常关闭
    SystemShutdown,

    // ═══ 认证 ═══
    /// 登录成功
    LoginSuccess,
    /// 登录失败
    LoginFailed,

    // ═══ 用户与权限 ═══
    /// 用户创建
    UserCreated,
    /// 用户更新
    UserUpdated,
    /// 角色创建
    RoleCreated,
    /// 角色更新
    RoleUpdated,
    /// 角色删除
    RoleDeleted,
    /// 权限定义创建
    PermissionCreated,
    /// 权限定义删除
    PermissionDeleted,
    /// 角色授予用户
    RoleAssigned,
    /// 角色授权撤销
    RoleAssignmentRevoked,

    // ═══ 社员档案 ═══
    /// 社员创建
    MemberCreated,
    /// 社员更新
    MemberUpdated,
    /// 社员删除（软删除）
    MemberDeleted,

    // ═══ 通讯组 ═══
    /// 通讯组创建
    GroupCreated,
    /// 通讯组更新
    GroupUpdated,
    /// 通讯组删除（软删除）
    GroupDeleted,

    // ═══ 群发 ═══
    /// 群发任务创建
    CampaignCreated,
    /// 群发任务更新
    CampaignUpdated,
    /// 群发启动
    CampaignDispatched,
    /// 群发完成
    CampaignCompleted,
    /// 群发失败
    CampaignFailed,
    /// 群发取消
    CampaignCancelled,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 审计日志条目（不可变）
///
/// 每条记录包含 SHA256 哈希链，确保防篡改。
/// - `prev_hash`: 前一条记录的哈希
/// - `curr_hash`: 当前记录的哈希（包含 prev_hash + 所有字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 全局递增序列号（唯一标识）
    pub id: i64,
    /// 时间戳（Unix 毫秒）
    pub timestamp: i64,
    /// 操作类型
    pub action: AuditAction,
    /// 资源类型（如 "campaign", "user", "system"）
    pub resource_type: String,
    /// 资源 ID
    pub resource_id: String,
    /// 操作人 ID（系统事件为 None）
    pub operator_id: Option<i64>,
    /// 操作人名称
    pub operator_name: Option<String>,
    /// 结构化详情（JSON）
    pub details: serde_json::Value,
    /// 前一条审计日志哈希
    pub prev_hash: String,
    /// 当前记录哈希（SHA256）
    pub curr_hash: String,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    /// 起始时间（Unix 毫秒，含）
    pub from: Option<i64>,
    /// 截止时间（Unix 毫秒，含）
    pub to: Option<i64>,
    /// 资源类型过滤
    pub resource_type: Option<String>,
    /// 操作人 ID 过滤
    pub operator_id: Option<i64>,
    /// 分页偏移
    #[serde(default)]
    pub offset: i64,
    /// 分页大小（默认 50）
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// 审计日志列表响应
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: i64,
}

/// 审计链验证结果
#[derive(Debug, Serialize)]
pub struct AuditChainVerification {
    /// 验证的记录总数
    pub total_entries: i64,
    /// 链是否完整
    pub chain_intact: bool,
    /// 断裂点列表
    pub breaks: Vec<AuditChainBreak>,
}

/// 审计链断裂点
#[derive(Debug, Serialize)]
pub struct AuditChainBreak {
    /// 断裂处的序列号
    pub entry_id: i64,
    /// 期望的哈希
    pub expected: String,
    /// 实际的哈希
    pub actual: String,
}
