use std::time::Instant;

use axum::{extract::Request, http::Method, middleware::Next, response::Response};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

/// 请求所属的界面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// 启停后台轮询
    Control,
    Health,
    Page,
}

impl RouteKind {
    pub fn of(path: &str) -> Self {
        match path {
            "/start_polling" | "/stop_polling" => Self::Control,
            "/health" => Self::Health,
            _ => Self::Page,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Health => "health",
            Self::Page => "page",
        }
    }
}

/// 请求日志
///
/// 只记录路径，查询字符串里是用户输入的问题，不进日志。
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let kind = RouteKind::of(&path);
    let start = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed = start.elapsed();

    if status.is_server_error() {
        warn!(
            "请求失败: [{}] {} {} - 状态: {} - 耗时: {:?}",
            kind.as_str(),
            method,
            path,
            status,
            elapsed
        );
    } else if kind == RouteKind::Health {
        debug!("健康检查: {} - 耗时: {:?}", status, elapsed);
    } else {
        info!(
            "[{}] {} {} - 状态: {} - 耗时: {:?}",
            kind.as_str(),
            method,
            path,
            status,
            elapsed
        );
    }

    response
}

/// 页面表单只使用 GET 与 POST
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_kind() {
        assert_eq!(RouteKind::of("/start_polling"), RouteKind::Control);
        assert_eq!(RouteKind::of("/stop_polling"), RouteKind::Control);
        assert_eq!(RouteKind::of("/health"), RouteKind::Health);
        assert_eq!(RouteKind::of("/llama_reply"), RouteKind::Page);
        assert_eq!(RouteKind::of("/"), RouteKind::Page);
    }
}
