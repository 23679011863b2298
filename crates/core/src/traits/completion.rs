use async_trait::async_trait;

use crate::PortalResult;

/// 语言模型补全服务
///
/// 实现必须是无状态或初始化后只读的，可在多个请求间共享而无需加锁。
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 服务名称，用于日志
    fn name(&self) -> &str;

    /// 以单条用户消息请求补全，返回回复文本
    async fn complete(&self, model: &str, prompt: &str) -> PortalResult<String>;
}
