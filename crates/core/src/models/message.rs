use serde::{Deserialize, Serialize};

/// 从聊天平台收到的一条文本消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub update_id: i64,
    pub chat_id: i64,
    pub sender_name: Option<String>,
    pub text: String,
}

impl InboundMessage {
    /// 解析Bot命令，例如 `/start` 或 `/start@my_bot` 均返回 `start`
    pub fn command(&self) -> Option<&str> {
        let first = self.text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    pub fn is_command(&self) -> bool {
        self.command().is_some()
    }
}
