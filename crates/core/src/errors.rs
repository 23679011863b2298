use thiserror::Error;

/// 门户错误类型定义
#[derive(Debug, Error)]
pub enum PortalError {
    /// 传输层或补全服务无法构建（凭证缺失、握手失败等）
    #[error("初始化失败: {0}")]
    Setup(String),

    #[error("Bot已在运行")]
    AlreadyRunning,

    #[error("补全服务错误: {0}")]
    Backend(String),

    /// 聊天传输层错误，`retryable` 为 false 时接收循环必须终止
    #[error("传输层错误: {message}")]
    Transport { message: String, retryable: bool },

    #[error("清理步骤 '{step}' 失败: {message}")]
    Teardown { step: String, message: String },

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("预测模型错误: {0}")]
    Prediction(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl PortalError {
    /// 可重试的传输层错误
    pub fn transport_retryable<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// 不可恢复的传输层错误
    pub fn transport_fatal<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { retryable: true, .. })
    }

    pub fn is_fatal_transport(&self) -> bool {
        matches!(self, Self::Transport { retryable: false, .. })
    }
}

/// 统一的Result类型
pub type PortalResult<T> = std::result::Result<T, PortalError>;
