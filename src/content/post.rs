use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// 文章封面图
///
/// 由托管层代理到真实资源，组件内只透传 url 与块 id。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverImage {
    pub url: String,
    #[serde(rename = "blockId")]
    pub block_id: String,
}

/// 预览内容块
///
/// 正文开头的若干块，用于索引页摘要展示。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewBlock {
    pub id: String,
    pub text: String,
}

/// 作者信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    /// 展示名
    pub full_name: String,
}

/// 博客文章记录
///
/// 从文档服务的索引表解析得到。字段名与索引表列名保持一致，
/// 因此序列化采用 PascalCase。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostRecord {
    /// 文章唯一标识，用于 URL
    pub slug: String,
    /// 标题，索引表中的列名为 `Page`
    #[serde(rename = "Page")]
    pub title: String,
    /// 发布标记
    #[serde(default)]
    pub published: bool,
    /// 发布日期，草稿可以没有
    #[serde(default, deserialize_with = "parse_date_opt")]
    pub date: Option<NaiveDate>,
    /// 作者 id 列表，可能为空
    #[serde(default)]
    pub authors: Vec<String>,
    /// 标签列表，可能为空
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "preview", default)]
    pub preview: Vec<PreviewBlock>,
    #[serde(rename = "cover", default)]
    pub cover: Option<CoverImage>,
}

impl PostRecord {
    /// 发布判定：设置了发布标记且填写了日期
    pub fn is_published(&self) -> bool {
        self.published && self.date.is_some()
    }
}

/// 博客索引表
///
/// 按文档服务返回的行顺序保存 [`PostRecord`]，slug 唯一。
#[derive(Debug, Clone, Default)]
pub struct PostTable {
    records: Vec<PostRecord>,
}

impl PostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一条记录
    ///
    /// slug 与已有记录重复时返回错误，重复意味着上游数据损坏。
    pub fn insert(&mut self, record: PostRecord) -> Result<()> {
        if self.get(&record.slug).is_some() {
            return Err(Error::Upstream("duplicate slug in blog index"));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, slug: &str) -> Option<&PostRecord> {
        self.records.iter().find(|r| r.slug == slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for PostTable {
    type Item = PostRecord;
    type IntoIter = std::vec::IntoIter<PostRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

fn parse_date_opt<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    let Some(s) = s else {
        return Ok(None);
    };

    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }

    for fmt in &["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Some(date));
        }
    }

    Err(serde::de::Error::custom(format!("无法解析日期: {}", s)))
}
