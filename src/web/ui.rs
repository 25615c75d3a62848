use axum::response::{Html, IntoResponse};

/// 首页处理器：每个模型一个标签页
pub async fn index_handler() -> impl IntoResponse {
    Html(include_str!("../../templates/index.html"))
}
