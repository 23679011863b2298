use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// HTTP层错误
///
/// 补全服务与预测模型的失败会以文本形式渲染在页面中，这里只处理页面本身无法生成的情况。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("模板渲染错误: {0}")]
    Template(#[from] tera::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::Template(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TEMPLATE_ERROR"),
        };
        error!("请求处理失败: {}", self);

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type,
                "code": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
