use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::{
    content::{self, BlogIndex},
    error::Result,
    state::AppState,
};

/// 配置博客索引相关路由。
///
/// 路由包括：
/// - `GET /blog`：索引页数据（文章列表 + 全部标签）
/// - `GET /blog/tags`：获取所有标签
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/blog", get(blog_index))
        .route("/blog/tags", get(blog_tags))
}

/// 携带预览密钥的请求头
const PREVIEW_HEADER: &str = "x-preview-secret";

/// 索引输出在该时间窗口内可被缓存，到期后由托管层负责再验证
const REVALIDATE_SECS: u32 = 10;

/// 查询参数，用于索引页标签筛选。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    /// 按标签筛选，可重复出现（`?tag=x&tag=y`）
    tag: Vec<String>,
}

/// 获取博客索引。
///
/// 拉取索引表并构建渲染就绪的 [`BlogIndex`]。携带正确预览密钥的
/// 请求可以看到草稿，标签筛选在构建完成之后进行，不影响 `allTags`。
async fn blog_index(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<IndexParams>,
) -> Result<Response> {
    let mut index = build(&app, &headers).await?;

    if !params.tag.is_empty() {
        index
            .posts
            .retain(|post| params.tag.iter().any(|t| post.tags.contains(t)));
    }

    Ok(with_revalidate(Json(index)))
}

/// 获取所有文章标签。
///
/// 标签遵循与索引页相同的可见性规则，草稿标签只在预览模式下出现。
async fn blog_tags(State(app): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let index = build(&app, &headers).await?;
    Ok(with_revalidate(Json(index.tags)))
}

/// 拉取索引表并运行索引构建。
///
/// 预览标志由请求头中的密钥推导，作者解析复用同一个客户端。
async fn build(app: &AppState, headers: &HeaderMap) -> Result<BlogIndex> {
    let preview = preview_requested(app, headers);
    let table = app.notion().get_blog_index().await?;
    content::build_index(table, preview, app.notion()).await
}

fn preview_requested(app: &AppState, headers: &HeaderMap) -> bool {
    let token = headers.get(PREVIEW_HEADER).and_then(|v| v.to_str().ok());
    app.preview_allowed(token)
}

/// 为响应附加再验证窗口的缓存头
fn with_revalidate(body: impl IntoResponse) -> Response {
    let mut resp = body.into_response();
    resp.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_str(&format!(
            "s-maxage={}, stale-while-revalidate",
            REVALIDATE_SECS
        ))
        .expect("Failed to create Cache-Control header"),
    );
    resp
}
