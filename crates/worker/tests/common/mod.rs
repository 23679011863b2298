#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use portal_core::{
    ChatTransport, CompletionBackend, InboundMessage, PortalError, PortalResult, TransportFactory,
    WorkerSnapshot, WorkerStatus,
};
use portal_worker::{ChatRelay, PollingController};

/// 一次 `receive` 调用的脚本化结果
#[derive(Debug, Clone)]
pub enum Step {
    Messages(Vec<InboundMessage>),
    Retryable(String),
    Fatal(String),
}

#[derive(Debug, Clone)]
pub enum Handshake {
    Ok,
    Fail(String),
    Hang,
}

/// 每次 `create` 时复制一份的传输层行为
#[derive(Debug, Clone)]
pub struct Plan {
    pub handshake: Handshake,
    pub steps: Vec<Step>,
    /// 脚本耗尽后模拟长轮询空等的时长
    pub idle_poll: Duration,
    pub send_fails: bool,
    pub teardown_fails: bool,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            handshake: Handshake::Ok,
            steps: Vec::new(),
            idle_poll: Duration::from_secs(10),
            send_fails: false,
            teardown_fails: false,
        }
    }
}

/// 测试方观察传输层调用的探针，跨多个传输层实例累计
#[derive(Debug, Default)]
pub struct Probe {
    pub created: AtomicUsize,
    pub initialized: AtomicUsize,
    pub receives: AtomicUsize,
    pub stop_receiving: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub sent: Mutex<Vec<(i64, String)>>,
}

impl Probe {
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct FakeTransport {
    plan: Plan,
    steps: Mutex<VecDeque<Step>>,
    probe: Arc<Probe>,
}

#[async_trait]
impl ChatTransport for FakeTransport {
    fn name(&self) -> &str {
        "fake"
    }

    async fn initialize(&self) -> PortalResult<()> {
        self.probe.initialized.fetch_add(1, Ordering::SeqCst);
        match &self.plan.handshake {
            Handshake::Ok => Ok(()),
            Handshake::Fail(reason) => Err(PortalError::Setup(reason.clone())),
            Handshake::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }

    async fn receive(&self) -> PortalResult<Vec<InboundMessage>> {
        self.probe.receives.fetch_add(1, Ordering::SeqCst);
        let next = self.steps.lock().unwrap().pop_front();
        match next {
            Some(Step::Messages(messages)) => Ok(messages),
            Some(Step::Retryable(message)) => Err(PortalError::transport_retryable(message)),
            Some(Step::Fatal(message)) => Err(PortalError::transport_fatal(message)),
            None => {
                tokio::time::sleep(self.plan.idle_poll).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send(&self, chat_id: i64, text: &str) -> PortalResult<()> {
        if self.plan.send_fails {
            return Err(PortalError::transport_retryable("send failed"));
        }
        self.probe
            .sent
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        Ok(())
    }

    async fn stop_receiving(&self) -> PortalResult<()> {
        self.probe.stop_receiving.fetch_add(1, Ordering::SeqCst);
        if self.plan.teardown_fails {
            return Err(PortalError::Teardown {
                step: "stop_receiving".into(),
                message: "ack failed".into(),
            });
        }
        Ok(())
    }

    async fn shutdown(&self) -> PortalResult<()> {
        self.probe.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.plan.teardown_fails {
            return Err(PortalError::Teardown {
                step: "shutdown".into(),
                message: "close failed".into(),
            });
        }
        Ok(())
    }
}

pub struct FakeFactory {
    pub plan: Mutex<Plan>,
    pub create_error: Mutex<Option<String>>,
    pub probe: Arc<Probe>,
}

impl FakeFactory {
    pub fn new(plan: Plan) -> Arc<Self> {
        Arc::new(Self {
            plan: Mutex::new(plan),
            create_error: Mutex::new(None),
            probe: Arc::new(Probe::default()),
        })
    }

    pub fn set_plan(&self, plan: Plan) {
        *self.plan.lock().unwrap() = plan;
    }
}

impl TransportFactory for FakeFactory {
    fn create(&self) -> PortalResult<Box<dyn ChatTransport>> {
        if let Some(reason) = self.create_error.lock().unwrap().clone() {
            return Err(PortalError::Setup(reason));
        }
        self.probe.created.fetch_add(1, Ordering::SeqCst);
        let plan = self.plan.lock().unwrap().clone();
        Ok(Box::new(FakeTransport {
            steps: Mutex::new(plan.steps.iter().cloned().collect()),
            plan,
            probe: Arc::clone(&self.probe),
        }))
    }
}

/// 补全服务替身
pub struct FakeBackend {
    pub fail: bool,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeBackend {
    pub fn answering() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            delay,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, _model: &str, prompt: &str) -> PortalResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(PortalError::Backend("HTTP 503: unavailable".into()));
        }
        Ok(format!("reply to {prompt}"))
    }
}

pub fn text(update_id: i64, chat_id: i64, text: &str) -> InboundMessage {
    InboundMessage {
        update_id,
        chat_id,
        sender_name: Some("Tester".to_string()),
        text: text.to_string(),
    }
}

pub fn controller(
    factory: Arc<FakeFactory>,
    backend: Option<Arc<FakeBackend>>,
) -> PollingController {
    let backend = backend.map(|b| b as Arc<dyn CompletionBackend>);
    let relay = Arc::new(ChatRelay::new(backend, "test-model"));
    PollingController::builder(factory, relay)
        .check_interval(Duration::from_millis(50))
        .startup_timeout(Duration::from_secs(1))
        .stop_timeout(Duration::from_secs(15))
        .max_consecutive_failures(3)
        .retry_delay(Duration::from_millis(20))
        .build()
}

/// 轮询状态直到满足条件或超时
pub async fn wait_for<F>(controller: &PollingController, within: Duration, pred: F) -> WorkerSnapshot
where
    F: Fn(&WorkerSnapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        let snapshot = controller.status();
        if pred(&snapshot) || tokio::time::Instant::now() >= deadline {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn is_failed(snapshot: &WorkerSnapshot) -> bool {
    matches!(snapshot.status, WorkerStatus::Failed(_))
}
