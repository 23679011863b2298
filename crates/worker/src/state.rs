use std::sync::{Arc, RwLock};

use portal_core::WorkerSnapshot;

/// 控制器与后台上下文共享的状态
///
/// 写者只在字段赋值期间持有锁，读者总能拿到完整的快照。
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedSnapshot {
    inner: Arc<RwLock<WorkerSnapshot>>,
}

impl SharedSnapshot {
    pub(crate) fn read(&self) -> WorkerSnapshot {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut WorkerSnapshot),
    {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }
}
