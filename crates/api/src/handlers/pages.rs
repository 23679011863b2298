use axum::{extract::State, response::Html};
use tera::Context;

use super::PageForm;
use crate::error::ApiResult;
use crate::routes::AppState;

pub async fn index(State(state): State<AppState>) -> ApiResult<Html<String>> {
    state.pages.render("index.html", &Context::new())
}

pub async fn main_page(
    State(state): State<AppState>,
    PageForm(form): PageForm,
) -> ApiResult<Html<String>> {
    let mut context = Context::new();
    if let Some(name) = form.text() {
        context.insert("name", name);
    }
    state.pages.render("main.html", &context)
}

pub async fn llama(State(state): State<AppState>) -> ApiResult<Html<String>> {
    model_page(&state, "llama.html", &state.models.llama)
}

pub async fn deepseek(State(state): State<AppState>) -> ApiResult<Html<String>> {
    model_page(&state, "deepseek.html", &state.models.deepseek)
}

pub async fn dbs(State(state): State<AppState>) -> ApiResult<Html<String>> {
    state.pages.render("dbs.html", &Context::new())
}

fn model_page(state: &AppState, page: &str, model: &str) -> ApiResult<Html<String>> {
    let mut context = Context::new();
    context.insert("model", model);
    state.pages.render(page, &context)
}
