use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    content::{Author, CoverImage, PostRecord, PostTable, PreviewBlock},
    error::{Error, Result},
};

/// 渲染就绪的博客索引
///
/// `posts` 保持索引表的原始顺序（过滤后），`tags` 按首次出现顺序去重。
#[derive(Debug, Serialize)]
pub struct BlogIndex {
    pub posts: Vec<IndexedPost>,
    #[serde(rename = "allTags")]
    pub tags: Vec<String>,
    pub preview: bool,
}

/// 索引中的一篇文章，作者 id 已替换为展示名
///
/// 不回写 [`PostRecord`]，构建时生成新的输出结构，输入表保持原样。
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexedPost {
    pub slug: String,
    #[serde(rename = "Page")]
    pub title: String,
    pub published: bool,
    pub date: Option<NaiveDate>,
    /// 作者展示名，顺序与记录中的作者 id 顺序一致
    pub authors: Vec<String>,
    pub tags: Vec<String>,
    #[serde(rename = "preview")]
    pub preview: Vec<PreviewBlock>,
    #[serde(rename = "cover")]
    pub cover: Option<CoverImage>,
}

/// 批量作者解析
///
/// 把一组作者 id 解析为 [`Author`]，一次构建只调用一次。
pub trait AuthorResolver: Send + Sync {
    fn resolve(
        &self,
        ids: &BTreeSet<String>,
    ) -> impl std::future::Future<Output = Result<HashMap<String, Author>>>;
}

/// 构建博客索引
///
/// 1. 可见性过滤：`preview` 为真或文章已发布，其余行整体丢弃
/// 2. 一次遍历同时聚合标签（首次出现顺序去重）并收集作者 id
/// 3. 作者 id 集合交给 resolver 批量解析
/// 4. 生成作者名已替换的输出记录
///
/// 任何一个作者 id 解析不到都会使整次构建失败，不产生部分结果。
/// 空表不是错误，产出空的 posts 与 tags。
pub async fn build_index<R: AuthorResolver>(
    table: PostTable,
    preview: bool,
    resolver: &R,
) -> Result<BlogIndex> {
    let mut kept = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut author_ids: BTreeSet<String> = BTreeSet::new();

    // 被过滤掉的行不参与标签聚合与作者收集
    for record in table {
        if !preview && !record.is_published() {
            continue;
        }

        for tag in &record.tags {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.clone());
            }
        }
        author_ids.extend(record.authors.iter().cloned());

        kept.push(record);
    }

    let authors = resolver.resolve(&author_ids).await?;

    let posts = kept
        .into_iter()
        .map(|record| resolve_post(record, &authors))
        .collect::<Result<Vec<_>>>()?;

    Ok(BlogIndex {
        posts,
        tags,
        preview,
    })
}

/// 把记录中的作者 id 替换为展示名，保持原有顺序
fn resolve_post(record: PostRecord, authors: &HashMap<String, Author>) -> Result<IndexedPost> {
    let names = record
        .authors
        .iter()
        .map(|id| {
            authors
                .get(id)
                .map(|author| author.full_name.clone())
                .ok_or_else(|| Error::UnresolvedAuthor(id.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(IndexedPost {
        slug: record.slug,
        title: record.title,
        published: record.published,
        date: record.date,
        authors: names,
        tags: record.tags,
        preview: record.preview,
        cover: record.cover,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    // 模拟 Resolver：按固定映射查找，并记录每次收到的 id 集合
    struct FakeResolver {
        users: HashMap<String, Author>,
        calls: Mutex<Vec<BTreeSet<String>>>,
    }

    impl FakeResolver {
        fn new(users: &[(&str, &str)]) -> Self {
            Self {
                users: users
                    .iter()
                    .map(|(id, name)| {
                        (
                            id.to_string(),
                            Author {
                                full_name: name.to_string(),
                            },
                        )
                    })
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<BTreeSet<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AuthorResolver for FakeResolver {
        fn resolve(
            &self,
            ids: &BTreeSet<String>,
        ) -> impl std::future::Future<Output = Result<HashMap<String, Author>>> {
            self.calls.lock().unwrap().push(ids.clone());
            let out: HashMap<String, Author> = ids
                .iter()
                .filter_map(|id| self.users.get(id).map(|a| (id.clone(), a.clone())))
                .collect();
            async move { Ok(out) }
        }
    }

    fn record(value: serde_json::Value) -> PostRecord {
        serde_json::from_value(value).expect("解析记录失败")
    }

    fn sample_table() -> PostTable {
        let mut table = PostTable::new();
        table
            .insert(record(json!({
                "Slug": "a",
                "Page": "First",
                "Published": true,
                "Date": "2020-1-1",
                "Authors": ["u1"],
                "Tags": ["x", "y"]
            })))
            .expect("插入失败");
        table
            .insert(record(json!({
                "Slug": "b",
                "Page": "Draft",
                "Published": false,
                "Authors": [],
                "Tags": ["y"]
            })))
            .expect("插入失败");
        table
    }

    #[tokio::test]
    async fn test_build_filters_drafts() {
        let resolver = FakeResolver::new(&[("u1", "Ann")]);

        let index = build_index(sample_table(), false, &resolver)
            .await
            .expect("构建失败");

        assert_eq!(index.posts.len(), 1);
        assert_eq!(index.posts[0].slug, "a");
        assert_eq!(index.posts[0].authors, vec!["Ann"]);
        assert_eq!(index.posts[0].tags, vec!["x", "y"]);
        assert_eq!(index.tags, vec!["x", "y"]);
        assert!(!index.preview);

        // 被过滤的草稿不应把作者 id 带进解析请求
        assert_eq!(
            resolver.calls(),
            vec![BTreeSet::from(["u1".to_string()])],
            "resolver should be called exactly once with the kept posts' ids"
        );
    }

    #[tokio::test]
    async fn test_build_preview_includes_drafts() {
        let resolver = FakeResolver::new(&[("u1", "Ann")]);

        let index = build_index(sample_table(), true, &resolver)
            .await
            .expect("构建失败");

        let slugs: Vec<&str> = index.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b"]);
        // "y" 在两篇文章中出现，仍只计一次
        assert_eq!(index.tags, vec!["x", "y"]);
        assert!(index.preview);
        assert_eq!(resolver.calls(), vec![BTreeSet::from(["u1".to_string()])]);
    }

    #[tokio::test]
    async fn test_tags_dedup_first_seen_order() {
        let mut table = PostTable::new();
        table
            .insert(record(json!({
                "Slug": "a", "Page": "A", "Published": true, "Date": "2020-1-1",
                "Tags": ["z", "x"]
            })))
            .expect("插入失败");
        table
            .insert(record(json!({
                "Slug": "b", "Page": "B", "Published": true, "Date": "2020-1-2",
                "Tags": ["x", "y", "z"]
            })))
            .expect("插入失败");

        let resolver = FakeResolver::new(&[]);
        let index = build_index(table, false, &resolver).await.expect("构建失败");

        assert_eq!(index.tags, vec!["z", "x", "y"]);
    }

    #[tokio::test]
    async fn test_author_order_preserved() {
        let mut table = PostTable::new();
        table
            .insert(record(json!({
                "Slug": "a", "Page": "A", "Published": true, "Date": "2020-1-1",
                "Authors": ["u2", "u1"]
            })))
            .expect("插入失败");

        let resolver = FakeResolver::new(&[("u1", "Ann"), ("u2", "Bob")]);
        let index = build_index(table, false, &resolver).await.expect("构建失败");

        // 展示名顺序跟随记录中的 id 顺序，而不是解析结果的顺序
        assert_eq!(index.posts[0].authors, vec!["Bob", "Ann"]);
    }

    #[tokio::test]
    async fn test_unresolved_author_fails_build() {
        let mut table = PostTable::new();
        table
            .insert(record(json!({
                "Slug": "a", "Page": "A", "Published": true, "Date": "2020-1-1",
                "Authors": ["u1", "u9"]
            })))
            .expect("插入失败");

        let resolver = FakeResolver::new(&[("u1", "Ann")]);
        let result = build_index(table, false, &resolver).await;

        match result {
            Err(Error::UnresolvedAuthor(id)) => assert_eq!(id, "u9"),
            other => panic!("expected UnresolvedAuthor, got {:?}", other.map(|i| i.posts.len())),
        }
    }

    #[tokio::test]
    async fn test_empty_table_is_not_an_error() {
        let resolver = FakeResolver::new(&[]);
        let index = build_index(PostTable::new(), false, &resolver)
            .await
            .expect("空表应构建成功");

        assert!(index.posts.is_empty());
        assert!(index.tags.is_empty());
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let resolver = FakeResolver::new(&[("u1", "Ann")]);
        let table = sample_table();

        let first = build_index(table.clone(), false, &resolver)
            .await
            .expect("构建失败");
        let second = build_index(table, false, &resolver).await.expect("构建失败");

        let first = serde_json::to_value(&first).expect("序列化失败");
        let second = serde_json::to_value(&second).expect("序列化失败");
        assert_eq!(first, second, "same inputs should build identical output");
    }
}
