use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 后台轮询Worker状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum WorkerStatus {
    #[default]
    NotStarted,
    Running,
    Stopping,
    Stopped,
    Failed(String),
}

impl WorkerStatus {
    /// Running 或 Stopping：存在（或可能存在）活跃的后台上下文
    pub fn is_active(&self) -> bool {
        matches!(self, WorkerStatus::Running | WorkerStatus::Stopping)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerStatus::Stopped | WorkerStatus::Failed(_))
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStatus::NotStarted => write!(f, "not started"),
            WorkerStatus::Running => write!(f, "running"),
            WorkerStatus::Stopping => write!(f, "stopping"),
            WorkerStatus::Stopped => write!(f, "stopped"),
            WorkerStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Worker状态快照，由 `Status()` 一次性整体返回，不会出现部分更新的视图
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub status: WorkerStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub messages_handled: u64,
}

/// Start 操作的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    pub started_at: DateTime<Utc>,
    /// 后台上下文在启动超时内确认了传输层握手
    pub confirmed: bool,
}

/// Stop 操作的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// 没有活跃的后台上下文
    NotRunning,
    /// 后台上下文在超时内退出
    Stopped { teardown_failures: usize },
    /// 超时，后台上下文仍在异步收尾
    TimedOut,
}

impl StopOutcome {
    /// 已停止但存在需要关注的问题（超时或清理步骤失败）
    pub fn has_warnings(&self) -> bool {
        match self {
            StopOutcome::NotRunning => false,
            StopOutcome::Stopped { teardown_failures } => *teardown_failures > 0,
            StopOutcome::TimedOut => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(WorkerStatus::Running.is_active());
        assert!(WorkerStatus::Stopping.is_active());
        assert!(!WorkerStatus::NotStarted.is_active());
        assert!(WorkerStatus::Failed("x".into()).is_terminal());
        assert!(WorkerStatus::Stopped.is_terminal());
        assert!(!WorkerStatus::Running.is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(WorkerStatus::Failed("HTTP 401".into())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "HTTP 401");

        let json = serde_json::to_value(WorkerStatus::Running).unwrap();
        assert_eq!(json["state"], "running");
    }

    #[test]
    fn test_stop_outcome_warnings() {
        assert!(!StopOutcome::NotRunning.has_warnings());
        assert!(!StopOutcome::Stopped { teardown_failures: 0 }.has_warnings());
        assert!(StopOutcome::Stopped { teardown_failures: 2 }.has_warnings());
        assert!(StopOutcome::TimedOut.has_warnings());
    }
}
