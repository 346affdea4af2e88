//! 消息群发模块
//!
//! # 结构
//!
//! - [`segmentation`] - 160/70 计费分段
//! - [`phone`] - 号码归一化
//! - [`transport`] - 短信传输抽象 ([`SmsTransport`]) 与内存实现
//! - [`dispatcher`] - 群发调度器（顺序发送、固定间隔、后台任务）

pub mod dispatcher;
pub mod phone;
pub mod segmentation;
pub mod transport;

pub use dispatcher::CampaignDispatcher;
pub use transport::{SendReceipt, SmsTransport, TransportError};
