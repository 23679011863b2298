use axum::response::Html;
use tera::{Context, Tera};

use crate::error::ApiResult;

/// 编译期嵌入的页面模板，`.html` 后缀的模板自动转义
const TEMPLATES: [(&str, &str); 10] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("main.html", include_str!("../templates/main.html")),
    ("llama.html", include_str!("../templates/llama.html")),
    ("llama_reply.html", include_str!("../templates/llama_reply.html")),
    ("deepseek.html", include_str!("../templates/deepseek.html")),
    (
        "deepseek_reply.html",
        include_str!("../templates/deepseek_reply.html"),
    ),
    ("dbs.html", include_str!("../templates/dbs.html")),
    ("prediction.html", include_str!("../templates/prediction.html")),
    (
        "telegram_polling.html",
        include_str!("../templates/telegram_polling.html"),
    ),
];

/// HTML页面渲染器
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> ApiResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    pub fn render(&self, page: &str, context: &Context) -> ApiResult<Html<String>> {
        Ok(Html(self.tera.render(page, context)?))
    }

    /// 渲染只有一个结果文本 `r` 的页面
    pub fn render_result(&self, page: &str, result: &str) -> ApiResult<Html<String>> {
        let mut context = Context::new();
        context.insert("r", result);
        self.render(page, &context)
    }
}
