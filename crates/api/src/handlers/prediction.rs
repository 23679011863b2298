use axum::{extract::State, response::Html};
use tracing::{error, warn};

use super::{PageForm, QueryForm};
use crate::error::ApiResult;
use crate::routes::AppState;

pub async fn prediction(
    State(state): State<AppState>,
    PageForm(form): PageForm,
) -> ApiResult<Html<String>> {
    let result = predict(&state, &form);
    state.pages.render_result("prediction.html", &result)
}

fn predict(state: &AppState, form: &QueryForm) -> String {
    let raw = form.q.as_deref().unwrap_or_default();
    let value = match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warn!("预测输入无效: {:?}", raw);
            return format!("Invalid input: '{raw}' is not a number");
        }
    };

    let Some(predictor) = &state.predictor else {
        return "Error: prediction model is not available".to_string();
    };

    match predictor.predict(&[value]) {
        Ok(prediction) => format!("{prediction:.4}"),
        Err(e) => {
            error!("预测失败: input={}, error={}", value, e);
            format!("Error: {e}")
        }
    }
}
