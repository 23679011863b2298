use std::fmt;

use crate::{PortalError, PortalResult};

pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const COMPLETION_API_KEY_ENV: &str = "GROQ_API_KEY";

/// 进程启动时从环境变量读取的凭证
///
/// 凭证不进入配置文件。Bot令牌是必需的，补全服务密钥缺失时仅禁用补全功能。
#[derive(Clone)]
pub struct Credentials {
    pub bot_token: String,
    pub completion_api_key: Option<String>,
}

impl Credentials {
    /// 从进程环境变量读取凭证
    pub fn from_env() -> PortalResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过自定义查找函数读取凭证，空白值视为缺失
    pub fn from_lookup<F>(lookup: F) -> PortalResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = non_blank(BOT_TOKEN_ENV).ok_or_else(|| {
            PortalError::Configuration(format!("缺少必需的环境变量 {BOT_TOKEN_ENV}"))
        })?;

        Ok(Self {
            bot_token,
            completion_api_key: non_blank(COMPLETION_API_KEY_ENV),
        })
    }

    pub fn has_completion_key(&self) -> bool {
        self.completion_api_key.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"***")
            .field(
                "completion_api_key",
                &self.completion_api_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}
