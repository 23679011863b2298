use async_trait::async_trait;

use crate::{models::InboundMessage, PortalResult};

/// 聊天平台传输层
///
/// 由后台轮询上下文独占使用。`receive` 执行一次有界的长轮询，
/// 返回的 future 可能在停止信号到达时被丢弃，实现必须保证这不会丢失已确认的消息。
#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &str;

    /// 建立连接并完成握手（校验凭证、处理积压消息策略）
    async fn initialize(&self) -> PortalResult<()>;

    /// 等待并获取下一批入站消息，可能为空
    async fn receive(&self) -> PortalResult<Vec<InboundMessage>>;

    async fn send(&self, chat_id: i64, text: &str) -> PortalResult<()>;

    /// 清理步骤一：停止接收并确认已消费的消息
    async fn stop_receiving(&self) -> PortalResult<()>;

    /// 清理步骤二：关闭传输层，之后的发送均失败
    async fn shutdown(&self) -> PortalResult<()>;
}

/// 每次 Start 时构建一个全新的传输层实例
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> PortalResult<Box<dyn ChatTransport>>;
}
