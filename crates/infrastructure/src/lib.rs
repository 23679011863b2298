//! 外部服务适配层：Groq补全客户端、Telegram传输层与回归模型。

pub mod groq;
pub mod regression;
pub mod telegram;

pub use groq::GroqClient;
pub use regression::LinearRegressionModel;
pub use telegram::{TelegramTransport, TelegramTransportFactory};
