use std::path::PathBuf;
use std::time::Duration;

use crate::auth::JwtConfig;

/// 服务器配置 - 后台服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/sacco | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | SMS_COUNTRY_CODE | 254 | 国际区号（号码归一化） |
/// | SMS_SEND_INTERVAL_MS | 500 | 群发逐条间隔（毫秒） |
/// | ADMIN_INITIAL_PASSWORD | (generated) | 首次启动管理员密码 |
/// | ENABLE_AUDIT_LOG | true | 是否启用审计日志 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/sacco HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === 消息群发配置 ===
    /// 国际区号，用于号码归一化
    pub sms_country_code: String,
    /// 逐条发送的固定间隔（毫秒），保护上游网关限速
    pub sms_send_interval_ms: u64,

    // === 引导配置 ===
    /// 首次启动创建的管理员初始密码；未设置时随机生成并打印
    pub admin_initial_password: Option<String>,
    /// 是否启用审计日志
    pub enable_audit_log: bool,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/sacco".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            sms_country_code: std::env::var("SMS_COUNTRY_CODE").unwrap_or_else(|_| "254".into()),
            sms_send_interval_ms: std::env::var("SMS_SEND_INTERVAL_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(500),

            admin_initial_password: std::env::var("ADMIN_INITIAL_PASSWORD").ok(),
            enable_audit_log: std::env::var("ENABLE_AUDIT_LOG")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录 (work_dir/logs)
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 群发逐条间隔
    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.sms_send_interval_ms)
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
