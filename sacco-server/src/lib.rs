//! SACCO Back-Office Server - 储蓄信贷合作社后台服务
//!
//! # 架构概述
//!
//! 本模块是后台服务的主入口，提供以下核心功能：
//!
//! - **权限解析** (`auth`): 主角色 + 时限授权的数据库直查权限模型
//! - **消息群发** (`messaging`): 顺序、限速的短信群发调度
//! - **数据库** (`db`): SQLite (sqlx) 存储与仓储层
//! - **审计** (`audit`): 哈希链审计追踪
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! sacco-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 认证、权限解析
//! ├── messaging/     # 分段、号码归一化、传输、调度
//! ├── audit/         # 审计日志
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 工具函数
//! └── db/            # 数据库层
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod messaging;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService, PermissionResolver};
pub use core::{Config, Server, ServerState};
pub use messaging::CampaignDispatcher;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境 (dotenv, 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env 文件缺失不算错误
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   _____ ___   ______________
  / ___//   | / ____/ ____/ __ \
  \__ \/ /| |/ /   / /   / / / /
 ___/ / ___ / /___/ /___/ /_/ /
/____/_/  |_\____/\____/\____/
    "#
    );
}
