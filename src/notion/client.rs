use std::collections::{BTreeSet, HashMap};

use axum::http::{HeaderMap, HeaderValue};
use reqwest::header;
use serde::{Deserialize, Serialize};

use crate::content::{Author, AuthorResolver, PostRecord, PostTable};
use crate::error::Result;

const NOTION_API_BASE: &'static str = "https://www.notion.so/api/v3";

/// 文档服务客户端
///
/// 博客索引表与作者信息均来自该服务。请求失败直接上抛，
/// 不做重试，也不做降级。
#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    index_id: String,
}

impl NotionClient {
    /// 使用指定 token 与索引表 id 创建客户端
    ///
    /// ```ignore
    /// let notion = NotionClient::new("your_token", "collection-id");
    /// ```
    pub fn new<T: AsRef<str>>(token: T, index_id: impl Into<String>) -> Self {
        Self::with_base_url(token, index_id, NOTION_API_BASE)
    }

    /// 指定服务地址创建客户端，测试时可指向本地桩服务
    pub fn with_base_url<T: AsRef<str>>(
        token: T,
        index_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers({
                let mut header = HeaderMap::new();
                header.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
                header.insert(
                    header::AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token.as_ref()))
                        .expect("Failed to create Authorization header"),
                );
                header
            })
            .build()
            .expect("Failed to build reqwest client");

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            base_url,
            index_id: index_id.into(),
        }
    }

    /// 拉取博客索引表
    ///
    /// 每次调用都重新拉取，组件内不做缓存。行顺序以服务返回为准，
    /// slug 重复视为上游数据损坏。
    pub async fn get_blog_index(&self) -> Result<PostTable> {
        #[derive(Serialize)]
        struct RequestBody<'a> {
            collection_id: &'a str,
        }

        #[derive(Deserialize)]
        struct ResponseBody {
            rows: Vec<PostRecord>,
        }

        let resp: ResponseBody = self
            .client
            .post(format!("{}/queryCollection", self.base_url))
            .json(&RequestBody {
                collection_id: &self.index_id,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut table = PostTable::new();
        for record in resp.rows {
            table.insert(record)?;
        }
        Ok(table)
    }
}

impl AuthorResolver for NotionClient {
    /// 批量解析作者 id
    ///
    /// 一次构建只发起一次请求，服务未返回的 id 由调用方判定处理。
    async fn resolve(&self, ids: &BTreeSet<String>) -> Result<HashMap<String, Author>> {
        #[derive(Serialize)]
        struct RequestBody<'a> {
            ids: Vec<&'a str>,
        }

        #[derive(Deserialize)]
        struct ResponseBody {
            users: HashMap<String, Author>,
        }

        let resp: ResponseBody = self
            .client
            .post(format!("{}/getNotionUsers", self.base_url))
            .json(&RequestBody {
                ids: ids.iter().map(String::as_str).collect(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.users)
    }
}
