use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    completion_prediction::{CompletionConfig, PredictionConfig},
    server_observability::{ObservabilityConfig, ServerConfig},
    telegram_polling::{PollingConfig, TelegramConfig},
};

/// 门户系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub polling: PollingConfig,
    pub completion: CompletionConfig,
    pub prediction: PredictionConfig,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:5000".to_string(),
                request_timeout_seconds: 120,
            },
            telegram: TelegramConfig {
                api_base_url: "https://api.telegram.org".to_string(),
                poll_timeout_seconds: 10,
                drop_pending_updates: true,
                max_consecutive_failures: 5,
                retry_delay_ms: 1000,
            },
            polling: PollingConfig {
                shutdown_check_interval_ms: 1000,
                stop_timeout_seconds: 15,
                startup_timeout_seconds: 10,
                autostart: false,
            },
            completion: CompletionConfig {
                base_url: "https://api.groq.com/openai/v1".to_string(),
                chat_model: "llama-3.1-8b-instant".to_string(),
                llama_model: "llama-3.1-8b-instant".to_string(),
                deepseek_model: "deepseek-r1-distill-llama-70b".to_string(),
                request_timeout_seconds: 60,
            },
            prediction: PredictionConfig {
                model_path: "dbs.json".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                log_format: "pretty".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 合并顺序：内置默认值 → TOML配置文件 → `PORTAL_` 前缀的环境变量
    /// （嵌套键以 `__` 分隔）。
    ///
    /// 显式指定的 `config_path` 必须存在；未指定时依次探测默认路径，不存在则跳过。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Self::with_defaults(ConfigBuilder::builder())?;

        // 配置文件
        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = ["config/portal.toml", "portal.toml"];

            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        // 环境变量覆盖，优先级最高
        builder = builder.add_source(
            Environment::with_prefix("PORTAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();

        Ok(builder
            .set_default("server.bind_address", defaults.server.bind_address)?
            .set_default("server.request_timeout_seconds", 120_i64)?
            .set_default("telegram.api_base_url", defaults.telegram.api_base_url)?
            .set_default("telegram.poll_timeout_seconds", 10_i64)?
            .set_default("telegram.drop_pending_updates", true)?
            .set_default("telegram.max_consecutive_failures", 5_i64)?
            .set_default("telegram.retry_delay_ms", 1000_i64)?
            .set_default("polling.shutdown_check_interval_ms", 1000_i64)?
            .set_default("polling.stop_timeout_seconds", 15_i64)?
            .set_default("polling.startup_timeout_seconds", 10_i64)?
            .set_default("polling.autostart", false)?
            .set_default("completion.base_url", defaults.completion.base_url)?
            .set_default("completion.chat_model", defaults.completion.chat_model)?
            .set_default("completion.llama_model", defaults.completion.llama_model)?
            .set_default("completion.deepseek_model", defaults.completion.deepseek_model)?
            .set_default("completion.request_timeout_seconds", 60_i64)?
            .set_default("prediction.model_path", defaults.prediction.model_path)?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .set_default("observability.log_format", defaults.observability.log_format)?)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// 序列化为TOML字符串
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// 校验各配置段
    pub fn validate(&self) -> Result<()> {
        self.server.validate().context("服务器配置验证失败")?;

        self.telegram.validate().context("Telegram配置验证失败")?;

        self.polling.validate().context("轮询配置验证失败")?;

        self.completion.validate().context("补全服务配置验证失败")?;

        self.prediction.validate().context("预测模型配置验证失败")?;

        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        Ok(())
    }
}
