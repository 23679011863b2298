//! # Portal API
//!
//! 基于Axum的HTTP控制面：LLM查询页面、回归预测页面，以及Telegram轮询Worker的启停与状态查询。
//!
//! ## 端点
//!
//! - `/`, `/main`, `/llama`, `/deepseek`, `/dbs` - 表单页面
//! - `/llama_reply`, `/deepseek_reply` - 表单字段 `q`，调用补全服务
//! - `/prediction` - 表单字段 `q`，调用回归模型
//! - `/telegram_polling` - Worker状态页
//! - `POST /start_polling`, `POST /stop_polling` - Worker启停
//! - `GET /health` - 健康检查（JSON）
//!
//! 补全或预测失败时以文本形式渲染在页面中，不会返回5xx。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod routes;

use axum::Router;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};

pub use error::{ApiError, ApiResult};
pub use routes::{create_routes, AppState, ModelNames};

/// 创建完整的API应用
pub fn create_app(state: AppState) -> Router {
    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
