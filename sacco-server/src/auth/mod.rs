//! 认证授权模块
//!
//! 提供 JWT 认证、权限解析和中间件：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文
//! - [`PermissionResolver`] - 数据库驱动的权限解析器
//! - [`require_auth`] - 认证中间件

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod resolver;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{CurrentUserExt, require_auth};
pub use resolver::PermissionResolver;
