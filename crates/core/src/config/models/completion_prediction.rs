use std::time::Duration;

use serde::{Deserialize, Serialize};

/// OpenAI兼容补全服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub base_url: String,
    /// Telegram中继使用的模型
    pub chat_model: String,
    pub llama_model: String,
    pub deepseek_model: String,
    pub request_timeout_seconds: u64,
}

impl CompletionConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!("补全服务地址格式无效: {}", self.base_url));
        }

        for (name, model) in [
            ("chat_model", &self.chat_model),
            ("llama_model", &self.llama_model),
            ("deepseek_model", &self.deepseek_model),
        ] {
            if model.trim().is_empty() {
                return Err(anyhow::anyhow!("模型名称不能为空: {name}"));
            }
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("补全请求超时时间必须大于0"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// 回归模型文件路径（JSON）
    pub model_path: String,
}

impl PredictionConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model_path.is_empty() {
            return Err(anyhow::anyhow!("回归模型路径不能为空"));
        }
        Ok(())
    }
}
