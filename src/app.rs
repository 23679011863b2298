use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use portal_api::{create_app, AppState, ModelNames};
use portal_core::config::{AppConfig, Credentials};
use portal_core::{CompletionBackend, Predictor, StopOutcome};
use portal_infrastructure::{GroqClient, LinearRegressionModel, TelegramTransportFactory};
use portal_worker::{ChatRelay, ControllerSettings, PollingController};
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};

/// 主应用程序
///
/// 装配补全客户端、回归模型、Telegram传输层工厂与Worker控制器，并对外提供HTTP服务。
pub struct Application {
    config: AppConfig,
    controller: Arc<PollingController>,
    router: Router,
}

impl Application {
    pub fn new(config: AppConfig, credentials: Credentials) -> Result<Self> {
        info!("初始化应用程序");

        let completion = GroqClient::from_config(
            &config.completion,
            credentials.completion_api_key.clone(),
        )
        .map(|client| Arc::new(client) as Arc<dyn CompletionBackend>);

        let predictor = load_predictor(&config.prediction.model_path);

        let factory = Arc::new(TelegramTransportFactory::new(
            credentials.bot_token.clone(),
            config.telegram.clone(),
        ));
        let relay = Arc::new(ChatRelay::new(
            completion.clone(),
            config.completion.chat_model.clone(),
        ));
        let controller = Arc::new(
            PollingController::builder(factory, relay)
                .settings(ControllerSettings::from_config(
                    &config.telegram,
                    &config.polling,
                ))
                .build(),
        );

        let state = AppState::new(
            Arc::clone(&controller),
            completion,
            predictor,
            ModelNames::from_config(&config.completion),
        )
        .context("初始化页面模板失败")?;
        let router = create_app(state).layer(TimeoutLayer::new(config.server.request_timeout()));

        Ok(Self {
            config,
            controller,
            router,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn controller(&self) -> Arc<PollingController> {
        Arc::clone(&self.controller)
    }

    /// 绑定配置的地址并运行，直到收到关闭信号
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(&self.config.server.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.server.bind_address))?;

        if self.config.polling.autostart {
            self.autostart().await;
        }

        self.serve(listener, shutdown_rx).await
    }

    /// 在给定的监听器上提供HTTP服务，退出前停止后台轮询
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let address = listener.local_addr().context("读取监听地址失败")?;
        info!("API服务器启动在 http://{}", address);

        let served = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await;

        self.stop_worker().await;
        served.context("API服务器运行失败")
    }

    async fn autostart(&self) {
        info!("配置了自动启动，启动Telegram轮询");
        match self.controller.start().await {
            Ok(outcome) => info!(
                "Telegram轮询已自动启动: started_at={}, confirmed={}",
                outcome.started_at, outcome.confirmed
            ),
            Err(e) => error!("自动启动Telegram轮询失败: {}", e),
        }
    }

    async fn stop_worker(&self) {
        match self.controller.shutdown().await {
            Ok(StopOutcome::NotRunning) => {}
            Ok(StopOutcome::TimedOut) => warn!(
                "后台轮询未在 {:?} 内停止",
                self.controller.stop_timeout()
            ),
            Ok(outcome) => info!("后台轮询已停止: {:?}", outcome),
            Err(e) => error!("停止后台轮询失败: {}", e),
        }
    }
}

/// 模型文件缺失或无效时预测页面显示错误，但不影响其他功能
fn load_predictor(path: &str) -> Option<Arc<dyn Predictor>> {
    match LinearRegressionModel::load(path) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            warn!("回归模型不可用: {}", e);
            None
        }
    }
}
