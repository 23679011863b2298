use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use portal_core::config::CompletionConfig;
use portal_core::{CompletionBackend, Predictor};
use portal_worker::PollingController;

use crate::error::ApiResult;
use crate::handlers::{
    completion::{deepseek_reply, llama_reply},
    health::health_check,
    pages::{dbs, deepseek, index, llama, main_page},
    polling::{start_polling, stop_polling, telegram_polling},
    prediction::prediction,
};
use crate::pages::PageRenderer;

/// 页面使用的两个补全模型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNames {
    pub llama: String,
    pub deepseek: String,
}

impl ModelNames {
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self {
            llama: config.llama_model.clone(),
            deepseek: config.deepseek_model.clone(),
        }
    }
}

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<PollingController>,
    pub completion: Option<Arc<dyn CompletionBackend>>,
    pub predictor: Option<Arc<dyn Predictor>>,
    pub models: ModelNames,
    /// `/stop_polling` 的有界等待
    pub stop_timeout: Duration,
    pub pages: Arc<PageRenderer>,
}

impl AppState {
    pub fn new(
        controller: Arc<PollingController>,
        completion: Option<Arc<dyn CompletionBackend>>,
        predictor: Option<Arc<dyn Predictor>>,
        models: ModelNames,
    ) -> ApiResult<Self> {
        let stop_timeout = controller.stop_timeout();
        Ok(Self {
            controller,
            completion,
            predictor,
            models,
            stop_timeout,
            pages: Arc::new(PageRenderer::new()?),
        })
    }
}

/// 创建路由，页面同时接受 GET 与 POST
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 页面
        .route("/", get(index).post(index))
        .route("/main", get(main_page).post(main_page))
        .route("/llama", get(llama).post(llama))
        .route("/deepseek", get(deepseek).post(deepseek))
        .route("/dbs", get(dbs).post(dbs))
        // 查询
        .route("/llama_reply", get(llama_reply).post(llama_reply))
        .route("/deepseek_reply", get(deepseek_reply).post(deepseek_reply))
        .route("/prediction", get(prediction).post(prediction))
        // Telegram轮询控制
        .route(
            "/telegram_polling",
            get(telegram_polling).post(telegram_polling),
        )
        .route("/start_polling", post(start_polling))
        .route("/stop_polling", post(stop_polling))
        .with_state(state)
}
