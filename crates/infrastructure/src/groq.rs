use std::time::Duration;

use async_trait::async_trait;
use portal_core::{config::CompletionConfig, CompletionBackend, PortalError, PortalResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// OpenAI兼容的Groq补全客户端
///
/// 客户端在初始化后只读，可被HTTP处理器与Telegram中继共享。
pub struct GroqClient {
    /// HTTP客户端
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl GroqClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            request_timeout,
        }
    }

    /// 没有API密钥时返回 `None`，补全功能被禁用而不是报错
    pub fn from_config(config: &CompletionConfig, api_key: Option<String>) -> Option<Self> {
        match api_key {
            Some(key) => {
                info!("Groq客户端已初始化: {}", config.base_url);
                Some(Self::new(config.base_url.clone(), key, config.request_timeout()))
            }
            None => {
                info!("未设置补全服务API密钥，Groq客户端未初始化");
                None
            }
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionBackend for GroqClient {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, model: &str, prompt: &str) -> PortalResult<String> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!("请求补全: model={}, prompt_len={}", model, prompt.len());

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| PortalError::Backend(format!("请求补全服务失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("读取响应体失败: {e}"));
            return Err(PortalError::Backend(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| PortalError::Backend(format!("解析补全响应失败: {e}")))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PortalError::Backend("补全响应中没有choices".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}
