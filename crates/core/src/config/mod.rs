//! 配置管理
//!
//! 配置按以下顺序合并：内置默认值 → TOML配置文件 → `PORTAL_` 前缀的环境变量。
//! 凭证（Bot令牌、补全服务密钥）单独从环境变量读取，见 [`credentials`]。
//!
//! ```rust,no_run
//! use portal_core::config::AppConfig;
//!
//! let config = AppConfig::load(Some("config/portal.toml")).unwrap();
//! println!("监听地址: {}", config.server.bind_address);
//! ```

pub mod credentials;
pub mod models;

#[cfg(test)]
mod config_test;

pub use credentials::{Credentials, BOT_TOKEN_ENV, COMPLETION_API_KEY_ENV};
pub use models::*;
