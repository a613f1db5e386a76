use std::sync::Arc;

use axum::extract::FromRef;

use crate::notion::NotionClient;

/// 应用程序上下文
///
/// [`AppState`] 封装了文档服务客户端与预览密钥，提供统一访问入口。
#[derive(Clone, FromRef)]
pub struct AppState {
    notion: NotionClient,
    preview_secret: Option<Arc<str>>,
}

impl AppState {
    /// 创建一个新的 [`AppState`] 实例
    ///
    /// `preview_secret` 为 `None` 时预览模式整体关闭。
    pub fn new(notion: NotionClient, preview_secret: Option<String>) -> Self {
        Self {
            notion,
            preview_secret: preview_secret.map(Arc::<str>::from),
        }
    }

    /// 获取文档服务客户端
    pub fn notion(&self) -> &NotionClient {
        &self.notion
    }

    /// 校验请求携带的预览密钥
    pub fn preview_allowed(&self, token: Option<&str>) -> bool {
        match (&self.preview_secret, token) {
            (Some(secret), Some(token)) => secret.as_ref() == token,
            _ => false,
        }
    }
}
