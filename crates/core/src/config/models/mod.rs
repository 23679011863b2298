pub mod app_config;
pub mod completion_prediction;
pub mod server_observability;
pub mod telegram_polling;

// 重新导出常用配置类型
pub use app_config::AppConfig;
pub use completion_prediction::{CompletionConfig, PredictionConfig};
pub use server_observability::{ObservabilityConfig, ServerConfig};
pub use telegram_polling::{PollingConfig, TelegramConfig};
