use std::sync::Arc;

use portal_core::{CompletionBackend, InboundMessage, PortalError, PortalResult};
use tracing::{debug, error, info};

/// 补全失败时回复给用户的固定文本
pub const FALLBACK_REPLY: &str = "Error querying Groq service.";

/// 补全服务返回空内容时的回复
pub const EMPTY_REPLY: &str = "No response from Groq.";

/// 聊天中继：把入站文本转发给补全服务并返回回复
///
/// 无状态，补全错误在此处被捕获并转换为固定回复，不会传播到接收循环。
pub struct ChatRelay {
    backend: Option<Arc<dyn CompletionBackend>>,
    model: String,
}

impl ChatRelay {
    pub fn new(backend: Option<Arc<dyn CompletionBackend>>, model: impl Into<String>) -> Self {
        let model = model.into();
        match &backend {
            Some(b) => info!("聊天中继使用补全服务: {} (模型: {})", b.name(), model),
            None => info!("聊天中继未配置补全服务，文本消息将被忽略"),
        }
        Self { backend, model }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 请求补全，错误以显式结果返回
    pub async fn complete(&self, text: &str) -> PortalResult<String> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| PortalError::Backend("补全服务未配置".to_string()))?;

        let reply = backend.complete(&self.model, text).await?;
        if reply.trim().is_empty() {
            Ok(EMPTY_REPLY.to_string())
        } else {
            Ok(reply)
        }
    }

    /// 为一条入站消息生成回复，`None` 表示不回复
    pub async fn respond(&self, message: &InboundMessage) -> Option<String> {
        if let Some(command) = message.command() {
            return match command {
                "start" => Some(welcome_text(message.sender_name.as_deref())),
                other => {
                    debug!("忽略未知命令: /{}", other);
                    None
                }
            };
        }

        if message.text.trim().is_empty() {
            debug!("忽略空消息: update_id={}", message.update_id);
            return None;
        }

        if !self.is_enabled() {
            debug!("补全服务未配置，忽略消息: chat_id={}", message.chat_id);
            return None;
        }

        match self.complete(&message.text).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!("查询补全服务失败: chat_id={}, error={}", message.chat_id, e);
                Some(FALLBACK_REPLY.to_string())
            }
        }
    }
}

fn welcome_text(name: Option<&str>) -> String {
    format!(
        "🤖 Hello {}! I'm running with polling!\n\n",
        name.unwrap_or("User")
    )
}
