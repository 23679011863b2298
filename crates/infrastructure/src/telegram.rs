use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use portal_core::{
    config::TelegramConfig, ChatTransport, InboundMessage, PortalError, PortalResult,
    TransportFactory,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Telegram单条消息最大长度（字符）
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// `getUpdates` 之外的普通请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 长轮询请求在服务端等待时间之外额外留出的网络余量
const LONG_POLL_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<u16>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    id: i64,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    from: Option<Sender>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Sender {
    first_name: String,
}

/// 基于Bot API长轮询的Telegram传输层
pub struct TelegramTransport {
    client: reqwest::Client,
    /// `{api_base_url}/bot{token}`
    endpoint: String,
    config: TelegramConfig,
    /// 下一次 `getUpdates` 使用的offset，小于此值的更新均已确认
    next_offset: AtomicI64,
    closed: AtomicBool,
}

impl TelegramTransport {
    pub fn new(client: reqwest::Client, token: &str, config: TelegramConfig) -> Self {
        let endpoint = format!(
            "{}/bot{}",
            config.api_base_url.trim_end_matches('/'),
            token
        );
        Self {
            client,
            endpoint,
            config,
            next_offset: AtomicI64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn next_offset(&self) -> i64 {
        self.next_offset.load(Ordering::SeqCst)
    }

    /// 调用Bot API方法并按状态码分类错误：429与5xx可重试，其余失败不可恢复
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
        timeout: Duration,
    ) -> PortalResult<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, method))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PortalError::transport_retryable(format!("{method} 请求失败: {}", e.without_url()))
            })?;

        let status = response.status();
        let payload: ApiResponse<T> = response.json().await.map_err(|e| {
            classify_status(
                status.as_u16(),
                format!("{method} 响应解析失败 (HTTP {}): {}", status.as_u16(), e.without_url()),
            )
        })?;

        if !payload.ok || !status.is_success() {
            let code = payload.error_code.unwrap_or(status.as_u16());
            let description = payload
                .description
                .unwrap_or_else(|| "未知错误".to_string());
            return Err(classify_status(
                code,
                format!("{method} 失败 (HTTP {code}): {description}"),
            ));
        }

        payload
            .result
            .ok_or_else(|| PortalError::transport_fatal(format!("{method} 响应缺少result字段")))
    }

    fn poll_request_timeout(&self) -> Duration {
        self.config.poll_timeout() + LONG_POLL_MARGIN
    }
}

fn classify_status(code: u16, message: String) -> PortalError {
    if code == 429 || code >= 500 {
        PortalError::transport_retryable(message)
    } else {
        PortalError::transport_fatal(message)
    }
}

/// 按Telegram消息长度上限拆分回复，按字符而非字节计数
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    chars
        .chunks(max_chars.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn initialize(&self) -> PortalResult<()> {
        let me: BotUser = self
            .call("getMe", json!({}), REQUEST_TIMEOUT)
            .await
            .map_err(|e| PortalError::Setup(format!("Telegram握手失败: {e}")))?;

        info!(
            "Telegram Bot已连接: id={}, username={}",
            me.id,
            me.username.as_deref().unwrap_or("-")
        );

        // 长轮询要求未设置webhook
        let _: bool = self
            .call(
                "deleteWebhook",
                json!({ "drop_pending_updates": self.config.drop_pending_updates }),
                REQUEST_TIMEOUT,
            )
            .await
            .map_err(|e| PortalError::Setup(format!("删除webhook失败: {e}")))?;

        if self.config.drop_pending_updates {
            debug!("已丢弃积压的更新");
        }

        Ok(())
    }

    async fn receive(&self) -> PortalResult<Vec<InboundMessage>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PortalError::transport_fatal("传输层已关闭"));
        }

        let offset = self.next_offset();
        let mut body = json!({
            "timeout": self.config.poll_timeout_seconds,
            "allowed_updates": ["message"],
        });
        if offset > 0 {
            body["offset"] = json!(offset);
        }

        let updates: Vec<Update> = self
            .call("getUpdates", body, self.poll_request_timeout())
            .await?;

        let mut messages = Vec::with_capacity(updates.len());
        for update in updates {
            self.next_offset
                .fetch_max(update.update_id + 1, Ordering::SeqCst);

            let Some(message) = update.message else {
                continue;
            };
            match message.text {
                Some(text) => messages.push(InboundMessage {
                    update_id: update.update_id,
                    chat_id: message.chat.id,
                    sender_name: message.from.map(|u| u.first_name),
                    text,
                }),
                None => debug!("忽略非文本消息: update_id={}", update.update_id),
            }
        }

        Ok(messages)
    }

    async fn send(&self, chat_id: i64, text: &str) -> PortalResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PortalError::transport_fatal("传输层已关闭"));
        }

        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let _: Value = self
                .call(
                    "sendMessage",
                    json!({ "chat_id": chat_id, "text": chunk }),
                    REQUEST_TIMEOUT,
                )
                .await?;
        }

        Ok(())
    }

    async fn stop_receiving(&self) -> PortalResult<()> {
        let offset = self.next_offset();
        if offset == 0 {
            return Ok(());
        }

        // 以零等待的 getUpdates 确认已消费的offset，避免重启后重复投递
        let _: Vec<Value> = self
            .call(
                "getUpdates",
                json!({ "offset": offset, "timeout": 0, "limit": 1 }),
                REQUEST_TIMEOUT,
            )
            .await
            .map_err(|e| PortalError::Teardown {
                step: "stop_receiving".to_string(),
                message: e.to_string(),
            })?;

        debug!("已确认更新offset: {}", offset);
        Ok(())
    }

    async fn shutdown(&self) -> PortalResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            warn!("Telegram传输层重复关闭");
        }
        Ok(())
    }
}

/// 每次启动轮询时创建新的 [`TelegramTransport`]
pub struct TelegramTransportFactory {
    client: reqwest::Client,
    token: String,
    config: TelegramConfig,
}

impl TelegramTransportFactory {
    pub fn new(token: impl Into<String>, config: TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            config,
        }
    }
}

impl TransportFactory for TelegramTransportFactory {
    fn create(&self) -> PortalResult<Box<dyn ChatTransport>> {
        if self.token.trim().is_empty() {
            return Err(PortalError::Setup("Telegram Bot令牌为空".to_string()));
        }

        Ok(Box::new(TelegramTransport::new(
            self.client.clone(),
            self.token.trim(),
            self.config.clone(),
        )))
    }
}
