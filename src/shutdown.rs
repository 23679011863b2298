use std::sync::Arc;

use tokio::signal;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

/// 优雅关闭管理器
///
/// 进程收到 Ctrl+C 或 SIGTERM 后向所有订阅者广播一次关闭信号。
#[derive(Clone)]
pub struct ShutdownManager {
    /// 关闭信号发送器，关闭后置为 `None`
    shutdown_tx: Arc<RwLock<Option<broadcast::Sender<()>>>>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(4);
        Self {
            shutdown_tx: Arc::new(RwLock::new(Some(shutdown_tx))),
        }
    }

    /// 订阅关闭信号，关闭之后订阅会立即收到信号
    pub async fn subscribe(&self) -> broadcast::Receiver<()> {
        let shutdown_tx = self.shutdown_tx.read().await;
        match shutdown_tx.as_ref() {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(1);
                let _ = tx.send(());
                rx
            }
        }
    }

    /// 触发关闭，重复调用无效果
    pub async fn shutdown(&self) {
        let mut shutdown_tx = self.shutdown_tx.write().await;
        let Some(tx) = shutdown_tx.take() else {
            debug!("关闭信号已经发送过");
            return;
        };

        debug!("发送关闭信号给 {} 个订阅者", tx.receiver_count());
        let _ = tx.send(());
        info!("关闭信号已发送");
    }

    pub async fn is_shutdown(&self) -> bool {
        self.shutdown_tx.read().await.is_none()
    }

    /// 等待操作系统的终止信号，然后触发关闭
    pub async fn listen_for_os_signals(&self) {
        wait_for_os_signal().await;
        self.shutdown().await;
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_os_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("收到Ctrl+C信号"),
        _ = terminate => info!("收到SIGTERM信号"),
    }
}
