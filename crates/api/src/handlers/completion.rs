use axum::{extract::State, response::Html};
use tera::Context;
use tracing::{error, info};

use super::{PageForm, QueryForm};
use crate::error::ApiResult;
use crate::routes::AppState;

pub const NOT_CONFIGURED: &str = "Completion backend is not configured";

pub async fn llama_reply(
    State(state): State<AppState>,
    PageForm(form): PageForm,
) -> ApiResult<Html<String>> {
    let model = state.models.llama.clone();
    reply_page(&state, "llama_reply.html", &model, &form).await
}

pub async fn deepseek_reply(
    State(state): State<AppState>,
    PageForm(form): PageForm,
) -> ApiResult<Html<String>> {
    let model = state.models.deepseek.clone();
    reply_page(&state, "deepseek_reply.html", &model, &form).await
}

async fn reply_page(
    state: &AppState,
    page: &str,
    model: &str,
    form: &QueryForm,
) -> ApiResult<Html<String>> {
    let reply = ask(state, model, form).await;

    let mut context = Context::new();
    context.insert("model", model);
    context.insert("r", &reply);
    state.pages.render(page, &context)
}

/// 补全失败时返回页面上显示的错误文本
async fn ask(state: &AppState, model: &str, form: &QueryForm) -> String {
    let Some(backend) = &state.completion else {
        return NOT_CONFIGURED.to_string();
    };
    let Some(prompt) = form.text() else {
        return "Error: question must not be empty".to_string();
    };

    info!("页面请求补全: model={}, prompt_len={}", model, prompt.len());
    match backend.complete(model, prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("页面补全请求失败: model={}, error={}", model, e);
            format!("Error: {e}")
        }
    }
}
