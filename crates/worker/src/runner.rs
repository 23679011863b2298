use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use portal_core::{ChatTransport, InboundMessage, PortalError, PortalResult, WorkerStatus};
use tokio::sync::oneshot;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::relay::ChatRelay;
use crate::signal::ShutdownSignal;
use crate::state::SharedSnapshot;

/// 单个清理步骤的最长等待时间
const TEARDOWN_STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// 后台上下文的就绪通知，`Err` 携带握手失败原因
pub(crate) type ReadySender = oneshot::Sender<Result<(), String>>;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RunnerSettings {
    pub check_interval: Duration,
    pub max_consecutive_failures: u32,
    pub retry_delay: Duration,
}

/// 后台上下文退出时交还给控制器的报告
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub teardown_failures: usize,
}

/// 后台执行上下文
///
/// 单任务运行，内部没有并发。按 `check_interval` 观察停止信号，
/// 退出时写入最终状态，但从不清除信号。
pub(crate) struct Runner {
    transport: Box<dyn ChatTransport>,
    relay: Arc<ChatRelay>,
    signal: ShutdownSignal,
    state: SharedSnapshot,
    settings: RunnerSettings,
}

impl Runner {
    pub(crate) fn new(
        transport: Box<dyn ChatTransport>,
        relay: Arc<ChatRelay>,
        signal: ShutdownSignal,
        state: SharedSnapshot,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            transport,
            relay,
            signal,
            state,
            settings,
        }
    }

    pub(crate) async fn run(self, ready: ReadySender) -> RunReport {
        let transport_name = self.transport.name().to_string();
        info!("后台轮询上下文启动: transport={}", transport_name);

        let handshake = match self.until_shutdown(self.transport.initialize()).await {
            Some(result) => result,
            None => {
                info!("握手完成前收到停止信号");
                let _ = ready.send(Ok(()));
                let teardown_failures = self.teardown().await;
                self.finish(None);
                return RunReport { teardown_failures };
            }
        };

        if let Err(e) = handshake {
            let reason = e.to_string();
            error!("传输层握手失败: {}", reason);
            let teardown_failures = self.teardown().await;
            self.finish(Some(reason.clone()));
            // 接收方可能已因启动超时放弃等待
            let _ = ready.send(Err(reason));
            return RunReport { teardown_failures };
        }

        if ready.send(Ok(())).is_err() {
            debug!("启动方已不再等待就绪通知");
        }
        info!("传输层握手完成，开始接收消息: transport={}", transport_name);

        let outcome = self.poll_loop().await;
        if let Err(e) = &outcome {
            error!("接收循环异常终止: {}", e);
        }

        let teardown_failures = self.teardown().await;
        self.finish(outcome.err().map(|e| e.to_string()));

        info!(
            "后台轮询上下文退出: transport={}, teardown_failures={}",
            transport_name, teardown_failures
        );
        RunReport { teardown_failures }
    }

    async fn poll_loop(&self) -> PortalResult<()> {
        let mut consecutive_failures: u32 = 0;

        loop {
            if self.signal.is_set() {
                info!("检测到停止信号，退出接收循环");
                return Ok(());
            }

            let received = match self.until_shutdown(self.transport.receive()).await {
                Some(received) => received,
                None => {
                    info!("接收等待期间检测到停止信号");
                    return Ok(());
                }
            };

            match received {
                Ok(messages) => {
                    consecutive_failures = 0;
                    for message in messages {
                        self.dispatch(message).await;
                    }
                }
                Err(e) if e.is_retryable() => {
                    consecutive_failures += 1;
                    warn!(
                        "接收消息失败 ({}/{}): {}",
                        consecutive_failures, self.settings.max_consecutive_failures, e
                    );

                    if consecutive_failures >= self.settings.max_consecutive_failures {
                        return Err(PortalError::transport_fatal(format!(
                            "连续{consecutive_failures}次接收失败，最后一次错误: {e}"
                        )));
                    }

                    if self
                        .until_shutdown(sleep(self.settings.retry_delay))
                        .await
                        .is_none()
                    {
                        return Ok(());
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn dispatch(&self, message: InboundMessage) {
        debug!(
            "处理消息: update_id={}, chat_id={}",
            message.update_id, message.chat_id
        );

        if let Some(reply) = self.relay.respond(&message).await {
            if let Err(e) = self.transport.send(message.chat_id, &reply).await {
                warn!("发送回复失败: chat_id={}, error={}", message.chat_id, e);
            }
        }

        self.state.update(|snapshot| snapshot.messages_handled += 1);
    }

    /// 驱动 `fut` 直到完成，或在停止信号置位时放弃并返回 `None`
    async fn until_shutdown<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::pin!(fut);
        let mut ticker = interval(self.settings.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                output = &mut fut => return Some(output),
                _ = ticker.tick() => {
                    if self.signal.is_set() {
                        return None;
                    }
                }
            }
        }
    }

    /// 依次执行两个清理步骤，前一步失败不影响后一步
    async fn teardown(&self) -> usize {
        let mut failures = 0;

        match timeout(TEARDOWN_STEP_TIMEOUT, self.transport.stop_receiving()).await {
            Ok(Ok(())) => debug!("停止接收完成"),
            Ok(Err(e)) => {
                failures += 1;
                warn!("停止接收失败: {}", e);
            }
            Err(_) => {
                failures += 1;
                warn!("停止接收超时");
            }
        }

        match timeout(TEARDOWN_STEP_TIMEOUT, self.transport.shutdown()).await {
            Ok(Ok(())) => debug!("传输层已关闭"),
            Ok(Err(e)) => {
                failures += 1;
                warn!("关闭传输层失败: {}", e);
            }
            Err(_) => {
                failures += 1;
                warn!("关闭传输层超时");
            }
        }

        failures
    }

    fn finish(&self, failure: Option<String>) {
        self.state.update(|snapshot| match failure {
            Some(reason) => {
                snapshot.status = WorkerStatus::Failed(reason.clone());
                snapshot.last_error = Some(reason);
            }
            None => snapshot.status = WorkerStatus::Stopped,
        });
    }
}
