use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::audit::{AuditAction, AuditLogRequest, AuditService, AuditStorage, AuditWorker};
use crate::auth::{JwtService, PermissionResolver};
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::{DbService, seed};
use crate::messaging::transport::MemoryTransport;
use crate::messaging::CampaignDispatcher;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是后台服务的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | resolver | PermissionResolver | 权限解析器（直查数据库） |
/// | dispatcher | CampaignDispatcher | 群发调度器 |
/// | audit_service | AuditService | 审计日志服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 权限解析器
    pub resolver: PermissionResolver,
    /// 群发调度器
    pub dispatcher: CampaignDispatcher,
    /// 审计日志服务
    pub audit_service: AuditService,
    /// 审计 worker 的消费端，由 start_background_tasks 取走一次
    audit_rx: Arc<Mutex<Option<mpsc::Receiver<AuditLogRequest>>>>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/sacco.db) + 迁移 + 播种
    /// 3. 各服务 (JWT, Audit, Resolver, Dispatcher)
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("sacco.db");
        let db_path_str = db_path.to_string_lossy();
        let db_service = DbService::new(&db_path_str)
            .await
            .expect("Failed to initialize database");
        let pool = db_service.pool;

        seed::seed_if_empty(&pool, config)
            .await
            .expect("Failed to seed initial data");

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let (audit_service, audit_rx) = AuditService::channel(1024);
        let resolver = PermissionResolver::new(pool.clone());

        // Gateway integration is a deployment concern; until one is wired
        // in, sends are captured by the in-memory transport.
        tracing::warn!("No SMS gateway configured, using in-memory transport");
        let transport = Arc::new(MemoryTransport::new());

        let dispatcher = CampaignDispatcher::new(
            pool.clone(),
            transport,
            audit_service.clone(),
            config.sms_country_code.clone(),
            config.send_interval(),
        );

        Self {
            config: config.clone(),
            pool,
            jwt_service,
            resolver,
            dispatcher,
            audit_service,
            audit_rx: Arc::new(Mutex::new(Some(audit_rx))),
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 开始服务前调用
    ///
    /// 启动的任务：
    /// - 审计日志 worker
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        if !self.config.enable_audit_log {
            tracing::info!("Audit log disabled by configuration");
            return;
        }

        let Some(rx) = self.audit_rx.lock().unwrap().take() else {
            tracing::warn!("Audit worker already started");
            return;
        };

        let storage = AuditStorage::new(self.pool.clone());
        let shutdown = tasks.shutdown_token();
        tasks.spawn("audit_worker", TaskKind::Worker, async move {
            let worker = AuditWorker::new(storage);
            tokio::select! {
                _ = worker.run(rx) => {}
                _ = shutdown.cancelled() => {
                    tracing::info!("Audit worker stopping on shutdown signal");
                }
            }
        });
    }

    /// 记录系统启动审计
    pub async fn log_startup(&self) {
        self.audit_service
            .log(
                AuditAction::SystemStartup,
                "system",
                "sacco-server",
                None,
                None,
                serde_json::json!({ "environment": self.config.environment }),
            )
            .await;
    }

    /// 记录系统关闭审计
    pub async fn log_shutdown(&self) {
        self.audit_service
            .log(
                AuditAction::SystemShutdown,
                "system",
                "sacco-server",
                None,
                None,
                serde_json::json!({}),
            )
            .await;
    }

    /// 获取 JWT 服务
    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 获取权限解析器
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// 获取群发调度器
    pub fn dispatcher(&self) -> &CampaignDispatcher {
        &self.dispatcher
    }
}
