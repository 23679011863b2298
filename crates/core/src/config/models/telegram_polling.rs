use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Telegram Bot API 传输配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub api_base_url: String,
    /// `getUpdates` 长轮询等待时间（秒）
    pub poll_timeout_seconds: u64,
    /// 启动时丢弃积压的更新
    pub drop_pending_updates: bool,
    /// 连续可重试错误达到该次数后视为不可恢复
    pub max_consecutive_failures: u32,
    pub retry_delay_ms: u64,
}

impl TelegramConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "Telegram API地址格式无效: {}",
                self.api_base_url
            ));
        }

        if self.max_consecutive_failures == 0 {
            return Err(anyhow::anyhow!("最大连续失败次数必须大于0"));
        }

        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// 后台轮询生命周期配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// 停止信号检查间隔（毫秒），决定最坏情况下的停止延迟
    pub shutdown_check_interval_ms: u64,
    pub stop_timeout_seconds: u64,
    pub startup_timeout_seconds: u64,
    /// 进程启动时自动开始轮询
    pub autostart: bool,
}

impl PollingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.shutdown_check_interval_ms == 0 {
            return Err(anyhow::anyhow!("停止信号检查间隔必须大于0"));
        }

        if self.stop_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("停止超时时间必须大于0"));
        }

        if self.startup_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("启动超时时间必须大于0"));
        }

        if self.shutdown_check_interval_ms >= self.stop_timeout_seconds.saturating_mul(1000) {
            return Err(anyhow::anyhow!("停止信号检查间隔必须小于停止超时时间"));
        }

        Ok(())
    }

    pub fn shutdown_check_interval(&self) -> Duration {
        Duration::from_millis(self.shutdown_check_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_seconds)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_seconds)
    }
}
