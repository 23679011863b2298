use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use portal_core::config::{PollingConfig, TelegramConfig};
use portal_core::{
    PortalError, PortalResult, StartOutcome, StopOutcome, TransportFactory, WorkerSnapshot,
    WorkerStatus,
};
use tokio::sync::{oneshot, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::relay::ChatRelay;
use crate::runner::{RunReport, Runner, RunnerSettings};
use crate::signal::ShutdownSignal;
use crate::state::SharedSnapshot;

/// 回收已结束的后台上下文时的最长等待
const REAP_TIMEOUT: Duration = Duration::from_millis(100);

/// 控制器的时间与重试参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// 后台上下文观察停止信号的间隔
    pub check_interval: Duration,
    /// Start 等待握手完成的上限
    pub startup_timeout: Duration,
    /// 进程退出时使用的停止超时
    pub stop_timeout: Duration,
    pub max_consecutive_failures: u32,
    pub retry_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_millis(1000),
            startup_timeout: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(15),
            max_consecutive_failures: 5,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(telegram: &TelegramConfig, polling: &PollingConfig) -> Self {
        Self {
            check_interval: polling.shutdown_check_interval(),
            startup_timeout: polling.startup_timeout(),
            stop_timeout: polling.stop_timeout(),
            max_consecutive_failures: telegram.max_consecutive_failures,
            retry_delay: telegram.retry_delay(),
        }
    }

    fn runner(&self) -> RunnerSettings {
        RunnerSettings {
            check_interval: self.check_interval,
            max_consecutive_failures: self.max_consecutive_failures.max(1),
            retry_delay: self.retry_delay,
        }
    }
}

/// 控制器构建器
pub struct PollingControllerBuilder {
    factory: Arc<dyn TransportFactory>,
    relay: Arc<ChatRelay>,
    settings: ControllerSettings,
}

impl PollingControllerBuilder {
    pub fn new(factory: Arc<dyn TransportFactory>, relay: Arc<ChatRelay>) -> Self {
        Self {
            factory,
            relay,
            settings: ControllerSettings::default(),
        }
    }

    pub fn settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 设置停止信号检查间隔
    pub fn check_interval(mut self, check_interval: Duration) -> Self {
        self.settings.check_interval = check_interval;
        self
    }

    pub fn startup_timeout(mut self, startup_timeout: Duration) -> Self {
        self.settings.startup_timeout = startup_timeout;
        self
    }

    pub fn stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.settings.stop_timeout = stop_timeout;
        self
    }

    pub fn max_consecutive_failures(mut self, max_consecutive_failures: u32) -> Self {
        self.settings.max_consecutive_failures = max_consecutive_failures;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.settings.retry_delay = retry_delay;
        self
    }

    pub fn build(self) -> PollingController {
        PollingController {
            factory: self.factory,
            relay: self.relay,
            settings: self.settings,
            state: SharedSnapshot::default(),
            signal: ShutdownSignal::new(),
            handle: Mutex::new(None),
        }
    }
}

/// Worker生命周期控制器
///
/// 管理唯一的后台轮询上下文：Start 创建并启动，Stop 发出协作式停止信号并有界等待，
/// Status 返回一致的状态快照。所有修改操作都持有 `handle` 锁串行执行。
pub struct PollingController {
    factory: Arc<dyn TransportFactory>,
    relay: Arc<ChatRelay>,
    settings: ControllerSettings,
    state: SharedSnapshot,
    signal: ShutdownSignal,
    handle: Mutex<Option<JoinHandle<RunReport>>>,
}

impl PollingController {
    pub fn builder(
        factory: Arc<dyn TransportFactory>,
        relay: Arc<ChatRelay>,
    ) -> PollingControllerBuilder {
        PollingControllerBuilder::new(factory, relay)
    }

    /// 启动后台轮询上下文
    pub async fn start(&self) -> PortalResult<StartOutcome> {
        let mut handle = self.handle.lock().await;
        self.reconcile(&mut handle).await;

        if handle.is_some() {
            warn!("后台轮询上下文已在运行，拒绝重复启动");
            return Err(PortalError::AlreadyRunning);
        }

        let transport = self.factory.create().map_err(|e| match e {
            PortalError::Setup(message) => PortalError::Setup(message),
            other => PortalError::Setup(other.to_string()),
        })?;

        self.signal.clear();
        let started_at = Utc::now();
        self.state.update(|snapshot| {
            *snapshot = WorkerSnapshot {
                status: WorkerStatus::Running,
                started_at: Some(started_at),
                last_error: None,
                messages_handled: 0,
            };
        });

        let (ready_tx, ready_rx) = oneshot::channel();
        let runner = Runner::new(
            transport,
            Arc::clone(&self.relay),
            self.signal.clone(),
            self.state.clone(),
            self.settings.runner(),
        );
        // 句柄先入锁保护的槽位，start 在等待握手时被取消也不会丢失后台任务
        *handle = Some(tokio::spawn(runner.run(ready_tx)));
        info!("后台轮询上下文已创建，等待握手完成");

        match timeout(self.settings.startup_timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => {
                info!("后台轮询上下文启动成功: started_at={}", started_at);
                Ok(StartOutcome {
                    started_at,
                    confirmed: true,
                })
            }
            Ok(Ok(Err(reason))) => {
                // 握手失败后后台上下文会自行清理并退出
                if let Some(join) = handle.take() {
                    if let Err(e) = join.await {
                        self.record_panic(&e);
                    }
                }
                error!("后台轮询上下文启动失败: {}", reason);
                Err(PortalError::Setup(reason))
            }
            Ok(Err(_)) => {
                let reason = match handle.take() {
                    Some(join) => match join.await {
                        Ok(_) => "后台上下文未报告就绪状态即退出".to_string(),
                        Err(e) => self.record_panic(&e),
                    },
                    None => "后台上下文未报告就绪状态即退出".to_string(),
                };
                error!("后台轮询上下文启动失败: {}", reason);
                Err(PortalError::Internal(reason))
            }
            Err(_) => {
                warn!(
                    "等待握手超过 {:?}，后台上下文继续初始化",
                    self.settings.startup_timeout
                );
                Ok(StartOutcome {
                    started_at,
                    confirmed: false,
                })
            }
        }
    }

    /// 请求后台上下文停止，最多等待 `wait`
    ///
    /// 超时不会强制终止后台任务，它会在下一次观察到停止信号时自行退出并写入最终状态。
    pub async fn stop(&self, wait: Duration) -> PortalResult<StopOutcome> {
        let mut handle = self.handle.lock().await;
        self.reconcile(&mut handle).await;

        let Some(join) = handle.as_mut() else {
            debug!("没有活跃的后台轮询上下文");
            return Ok(StopOutcome::NotRunning);
        };

        self.state.update(|snapshot| {
            if snapshot.status == WorkerStatus::Running {
                snapshot.status = WorkerStatus::Stopping;
            }
        });
        self.signal.set();
        info!("已发出停止信号，最多等待 {:?}", wait);

        match timeout(wait, join).await {
            Ok(Ok(report)) => {
                *handle = None;
                info!(
                    "后台轮询上下文已停止: teardown_failures={}",
                    report.teardown_failures
                );
                Ok(StopOutcome::Stopped {
                    teardown_failures: report.teardown_failures,
                })
            }
            Ok(Err(e)) => {
                *handle = None;
                let reason = self.record_panic(&e);
                Err(PortalError::Internal(reason))
            }
            Err(_) => {
                warn!("等待后台轮询上下文退出超时 ({:?})，任务将在稍后自行结束", wait);
                Ok(StopOutcome::TimedOut)
            }
        }
    }

    /// 进程退出时停止后台上下文，使用配置的停止超时
    pub async fn shutdown(&self) -> PortalResult<StopOutcome> {
        self.stop(self.settings.stop_timeout).await
    }

    /// 当前状态快照
    pub fn status(&self) -> WorkerSnapshot {
        self.state.read()
    }

    /// 是否存在尚未结束的后台任务
    pub async fn is_alive(&self) -> bool {
        let handle = self.handle.lock().await;
        handle.as_ref().is_some_and(|join| !join.is_finished())
    }

    pub fn shutdown_requested(&self) -> bool {
        self.signal.is_set()
    }

    pub fn stop_timeout(&self) -> Duration {
        self.settings.stop_timeout
    }

    /// 回收已自行结束的后台任务，使句柄与状态保持一致
    async fn reconcile(&self, handle: &mut Option<JoinHandle<RunReport>>) {
        let Some(join) = handle.as_mut() else {
            return;
        };

        let status = self.state.read().status;
        if !join.is_finished() && !status.is_terminal() {
            return;
        }

        // 终止状态由后台任务在退出前写入，任务随后很快结束
        match timeout(REAP_TIMEOUT, join).await {
            Ok(Ok(report)) => {
                debug!(
                    "回收已结束的后台轮询上下文: status={}, teardown_failures={}",
                    status, report.teardown_failures
                );
                *handle = None;
            }
            Ok(Err(e)) => {
                self.record_panic(&e);
                *handle = None;
            }
            Err(_) => debug!("后台轮询上下文尚未结束，保留句柄"),
        }
    }

    fn record_panic(&self, e: &JoinError) -> String {
        let reason = format!("worker panicked: {e}");
        error!("后台轮询上下文异常退出: {}", reason);
        self.state.update(|snapshot| {
            snapshot.status = WorkerStatus::Failed(reason.clone());
            snapshot.last_error = Some(reason.clone());
        });
        reason
    }
}
