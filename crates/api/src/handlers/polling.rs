use axum::{extract::State, response::Html};
use portal_core::{PortalError, StopOutcome, WorkerSnapshot, WorkerStatus};
use tracing::{error, info, warn};

use crate::error::ApiResult;
use crate::routes::AppState;

const PAGE: &str = "telegram_polling.html";

pub const NOT_STARTED: &str = "Telegram polling not started.";

/// Worker状态页
pub async fn telegram_polling(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let text = status_text(&state.controller.status());
    state.pages.render_result(PAGE, &text)
}

pub async fn start_polling(State(state): State<AppState>) -> ApiResult<Html<String>> {
    info!("通过页面启动Bot");

    let text = match state.controller.start().await {
        Ok(outcome) => {
            if !outcome.confirmed {
                warn!("Bot仍在初始化，握手尚未确认");
            }
            "Bot started successfully".to_string()
        }
        Err(PortalError::AlreadyRunning) => "Bot is already polling".to_string(),
        Err(PortalError::Setup(reason)) => {
            error!("Bot启动失败: {}", reason);
            "Bot failed to start".to_string()
        }
        Err(e) => {
            error!("启动Bot出错: {}", e);
            format!("Error: {e}")
        }
    };

    state.pages.render_result(PAGE, &text)
}

pub async fn stop_polling(State(state): State<AppState>) -> ApiResult<Html<String>> {
    info!("通过页面停止Bot");

    let text = match state.controller.stop(state.stop_timeout).await {
        Ok(StopOutcome::NotRunning) => "Bot is not running".to_string(),
        Ok(outcome) if outcome.has_warnings() => {
            warn!("Bot停止存在警告: {:?}", outcome);
            "Bot stop completed with warnings".to_string()
        }
        Ok(_) => "Bot stopped successfully".to_string(),
        Err(e) => {
            error!("停止Bot出错: {}", e);
            format!("Error stopping bot: {e}")
        }
    };

    state.pages.render_result(PAGE, &text)
}

/// 状态快照的单行描述
pub fn status_text(snapshot: &WorkerSnapshot) -> String {
    if snapshot.status == WorkerStatus::NotStarted {
        return NOT_STARTED.to_string();
    }

    let mut text = format!("Status: {}", snapshot.status);
    if let Some(started_at) = snapshot.started_at {
        text.push_str(&format!(
            " | Started: {}",
            started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    text.push_str(&format!(" | Messages handled: {}", snapshot.messages_handled));
    if let Some(last_error) = &snapshot.last_error {
        text.push_str(&format!(" | Last error: {last_error}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_not_started_text() {
        assert_eq!(status_text(&WorkerSnapshot::default()), NOT_STARTED);
    }

    #[test]
    fn test_failed_status_text() {
        let snapshot = WorkerSnapshot {
            status: WorkerStatus::Failed("HTTP 401".into()),
            started_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap()),
            last_error: Some("HTTP 401".into()),
            messages_handled: 4,
        };

        assert_eq!(
            status_text(&snapshot),
            "Status: failed: HTTP 401 | Started: 2025-03-01 08:30:00 UTC \
             | Messages handled: 4 | Last error: HTTP 401"
        );
    }
}
