use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::remote::http::{Client, Http};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::{debug, error, info};

use super::{InteractionFilter, InteractionStore, PageRequest, StoreError};
use crate::config::Config;
use crate::models::interaction::InteractionRecord;

/// 交互记录所在的表，记录 ID 即推导出的文档键
pub const INTERACTION_TABLE: &str = "interaction";

/// SurrealDB 存储后端
///
/// 对连接类型泛型：生产环境使用远程 HTTP 连接，测试使用嵌入式内存引擎。
pub struct SurrealInteractionStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealInteractionStore<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl SurrealInteractionStore<Client> {
    /// 根据配置建立到 SurrealDB 的 HTTP 连接
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        info!("Initializing database connection to {}", config.database_url);

        let address = config
            .database_url
            .trim_start_matches("http://")
            .trim_start_matches("https://");

        let db = Surreal::new::<Http>(address).await?;
        db.signin(Root {
            username: &config.database_username,
            password: &config.database_password,
        })
        .await?;
        db.use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        let store = Self::new(db);
        store.verify_connection().await?;
        Ok(store)
    }
}

impl<C: Connection> SurrealInteractionStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<(), StoreError> {
        match self.db.query("INFO FOR DB").await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(StoreError::from(e))
            }
        }
    }
}

#[async_trait]
impl<C: Connection> InteractionStore for SurrealInteractionStore<C> {
    async fn get(&self, key: &str) -> Result<Option<InteractionRecord>, StoreError> {
        let document: Option<InteractionDocument> =
            self.db.select((INTERACTION_TABLE, key)).await?;
        document.map(InteractionRecord::try_from).transpose()
    }

    async fn put(&self, record: &InteractionRecord) -> Result<(), StoreError> {
        debug!("Replacing interaction record {}", record.document_key);
        let _: Option<InteractionDocument> = self
            .db
            .update((INTERACTION_TABLE, record.document_key.as_str()))
            .content(InteractionDocument::try_from(record)?)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let removed: Option<InteractionDocument> =
            self.db.delete((INTERACTION_TABLE, key)).await?;
        match removed {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn query_by_user(
        &self,
        user_id: &str,
        filter: &InteractionFilter,
        page: PageRequest,
    ) -> Result<Vec<InteractionRecord>, StoreError> {
        let mut conditions = vec!["user_id = $user_id"];
        if filter.bookmarked_only {
            conditions.push("is_bookmarked = true");
        }
        if filter.item_type.is_some() {
            conditions.push("item_type = $item_type");
        }

        let query = format!(
            "SELECT * FROM {} WHERE {} ORDER BY updated_at DESC, item_id ASC LIMIT $limit START $start",
            INTERACTION_TABLE,
            conditions.join(" AND ")
        );
        debug!("Executing query: {}", query);

        let limit = i64::try_from(page.limit)
            .map_err(|_| StoreError::Internal(format!("page limit {} out of range", page.limit)))?;
        let start = i64::try_from(page.offset)
            .map_err(|_| StoreError::Internal(format!("page offset {} out of range", page.offset)))?;

        let mut response = self
            .db
            .query(query)
            .bind(("user_id", user_id.to_string()))
            .bind((
                "item_type",
                filter.item_type.map(|t| t.as_str().to_string()),
            ))
            .bind(("limit", limit))
            .bind(("start", start))
            .await?;

        let documents: Vec<InteractionDocument> = response.take(0)?;
        documents
            .into_iter()
            .map(InteractionRecord::try_from)
            .collect()
    }
}

/// 数据库中的文档形态：枚举以字符串保存，时间以纳秒整数保存以便排序且读写无损
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InteractionDocument {
    document_key: String,
    item_id: String,
    item_type: String,
    user_id: String,
    vote_state: String,
    is_bookmarked: bool,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<&InteractionRecord> for InteractionDocument {
    type Error = StoreError;

    fn try_from(record: &InteractionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            document_key: record.document_key.clone(),
            item_id: record.item_id.clone(),
            item_type: record.item_type.as_str().to_string(),
            user_id: record.user_id.clone(),
            vote_state: record.vote_state.as_str().to_string(),
            is_bookmarked: record.is_bookmarked,
            created_at: to_nanos(&record.document_key, record.created_at)?,
            updated_at: to_nanos(&record.document_key, record.updated_at)?,
        })
    }
}

impl TryFrom<InteractionDocument> for InteractionRecord {
    type Error = StoreError;

    fn try_from(doc: InteractionDocument) -> Result<Self, Self::Error> {
        let invalid = |e: crate::models::interaction::UnknownVariant| {
            StoreError::Internal(format!("record {}: {}", doc.document_key, e))
        };

        Ok(InteractionRecord {
            item_type: doc.item_type.parse().map_err(invalid)?,
            vote_state: doc.vote_state.parse().map_err(invalid)?,
            created_at: from_nanos(doc.created_at),
            updated_at: from_nanos(doc.updated_at),
            is_bookmarked: doc.is_bookmarked,
            item_id: doc.item_id,
            user_id: doc.user_id,
            document_key: doc.document_key,
        })
    }
}

// i64 纳秒可表示 1677 年到 2262 年
fn to_nanos(key: &str, at: DateTime<Utc>) -> Result<i64, StoreError> {
    at.timestamp_nanos_opt()
        .ok_or_else(|| StoreError::Internal(format!("record {}: timestamp {} out of range", key, at)))
}

fn from_nanos(nanos: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos)
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        let message = err.to_string();
        let lowered = message.to_lowercase();

        if lowered.contains("permission")
            || lowered.contains("not allowed")
            || lowered.contains("authentication")
        {
            StoreError::PermissionDenied(message)
        } else if lowered.contains("conflict") || lowered.contains("can be retried") {
            StoreError::Conflict(message)
        } else if lowered.contains("connect")
            || lowered.contains("timed out")
            || lowered.contains("http")
            || lowered.contains("unreachable")
        {
            StoreError::Unavailable(message)
        } else {
            StoreError::Internal(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interaction::{ContentType, VoteState};
    use chrono::Duration;
    use surrealdb::engine::local::{Db, Mem};

    async fn memory_store() -> SurrealInteractionStore<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("interactions").await.unwrap();
        SurrealInteractionStore::new(db)
    }

    fn record(item_id: &str, user_id: &str, offset_secs: i64) -> InteractionRecord {
        let at = Utc::now() + Duration::seconds(offset_secs);
        InteractionRecord::new(item_id, ContentType::PromoCode, user_id, at)
    }

    #[tokio::test]
    async fn test_put_replaces_whole_record() {
        let store = memory_store().await;
        let mut stored = record("promo1", "userA", 0);

        store.put(&stored).await.unwrap();
        stored.vote_state = VoteState::Downvote;
        stored.is_bookmarked = true;
        store.put(&stored).await.unwrap();

        let fetched = store.get(&stored.document_key).await.unwrap();
        assert_eq!(fetched, Some(stored));
    }

    #[tokio::test]
    async fn test_timestamps_keep_nanosecond_precision() {
        let store = memory_store().await;
        let created = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let mut stored = InteractionRecord::new("post9", ContentType::Post, "userC", created);
        stored.is_bookmarked = true;
        stored.touch(created + Duration::nanoseconds(1));
        store.put(&stored).await.unwrap();

        let fetched = store.get(&stored.document_key).await.unwrap();
        assert_eq!(fetched.as_ref(), Some(&stored));

        let listed = store
            .query_by_user("userC", &InteractionFilter::bookmarked(), PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(listed, vec![stored]);
    }

    #[tokio::test]
    async fn test_out_of_range_timestamp_is_rejected_on_write() {
        let store = memory_store().await;
        let far_future = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
        let stored = InteractionRecord::new("post9", ContentType::Post, "userC", far_future);

        assert!(matches!(store.put(&stored).await, Err(StoreError::Internal(_))));
        assert_eq!(store.get(&stored.document_key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_rejected() {
        let store = memory_store().await;
        let result = store
            .query_by_user(
                "userC",
                &InteractionFilter::default(),
                PageRequest::new(usize::MAX, 10),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Internal(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_not_found() {
        let store = memory_store().await;
        let stored = record("promo2", "userA", 0);
        store.put(&stored).await.unwrap();

        store.delete(&stored.document_key).await.unwrap();
        assert_eq!(store.get(&stored.document_key).await.unwrap(), None);
        assert!(matches!(
            store.delete(&stored.document_key).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_query_by_user_orders_by_updated_at() {
        let store = memory_store().await;
        for (item, offset) in [("a", 0), ("b", 20), ("c", 10)] {
            let mut r = record(item, "userB", offset);
            r.is_bookmarked = true;
            store.put(&r).await.unwrap();
        }
        store.put(&record("d", "userB", 30)).await.unwrap();

        let page = store
            .query_by_user("userB", &InteractionFilter::bookmarked(), PageRequest::new(0, 10))
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        let typed = store
            .query_by_user(
                "userB",
                &InteractionFilter::bookmarked().with_item_type(Some(ContentType::Post)),
                PageRequest::new(0, 10),
            )
            .await
            .unwrap();
        assert!(typed.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_enum_value_is_rejected_on_read() {
        let store = memory_store().await;
        store
            .db
            .query(
                "CREATE interaction:bad CONTENT { document_key: 'bad', item_id: 'x', item_type: 'VIDEO', \
                 user_id: 'u', vote_state: 'NONE', is_bookmarked: false, created_at: 0, updated_at: 0 }",
            )
            .await
            .unwrap();

        let result = store.get("bad").await;
        assert!(matches!(result, Err(StoreError::Internal(msg)) if msg.contains("VIDEO")));
    }
}
