//! 后台轮询Worker
//!
//! 生命周期控制器、后台执行上下文与聊天中继。

pub mod controller;
pub mod relay;
pub mod runner;
pub mod signal;

mod state;

pub use controller::{ControllerSettings, PollingController, PollingControllerBuilder};
pub use relay::{ChatRelay, EMPTY_REPLY, FALLBACK_REPLY};
pub use runner::RunReport;
pub use signal::ShutdownSignal;
