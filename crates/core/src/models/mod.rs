//! # 数据模型
//!
//! 后台轮询Worker的状态模型与聊天消息模型。
//!
//! ## Worker状态流转
//! ```text
//! NotStarted/Stopped/Failed → Running → Stopping → Stopped | Failed
//!                                ↓
//!                              Failed   (后台上下文自行退出)
//! ```

pub mod message;
pub mod worker;

pub use message::*;
pub use worker::*;
