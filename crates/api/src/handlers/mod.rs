use axum::{
    extract::{rejection::FormRejection, FromRequest, Request},
    Form,
};
use serde::Deserialize;

pub mod completion;
pub mod health;
pub mod pages;
pub mod polling;
pub mod prediction;

/// 页面表单，GET 请求从查询字符串读取
#[derive(Debug, Default, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub q: Option<String>,
}

impl QueryForm {
    /// 去除首尾空白后的非空输入
    pub fn text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// 页面表单提取器
///
/// 没有表单 `Content-Type` 的 POST 视为空表单，页面照常渲染。
#[derive(Debug, Default)]
pub struct PageForm(pub QueryForm);

impl<S> FromRequest<S> for PageForm
where
    S: Send + Sync,
{
    type Rejection = FormRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<QueryForm>::from_request(req, state).await {
            Ok(Form(form)) => Ok(Self(form)),
            Err(FormRejection::InvalidFormContentType(_)) => Ok(Self::default()),
            Err(rejection) => Err(rejection),
        }
    }
}
