use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 协作式停止信号
///
/// 控制器写入，后台轮询上下文按固定间隔读取。只有新的成功 Start 会清除信号，
/// 后台上下文自身从不清除。
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求停止
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub(crate) fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
