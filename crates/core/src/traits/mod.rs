//! 外部协作方接口
//!
//! 补全服务、聊天传输层和回归预测器均通过特征抽象，
//! Worker和HTTP层只依赖这些接口，具体实现位于 `portal-infrastructure`。

pub mod completion;
pub mod predictor;
pub mod transport;

pub use completion::CompletionBackend;
pub use predictor::Predictor;
pub use transport::{ChatTransport, TransportFactory};
