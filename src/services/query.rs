use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::{
    models::interaction::{BookmarkPage, BookmarkQuery, InteractionRecord},
    services::{
        interaction::{require_id, InteractionError},
        store::{InteractionFilter, InteractionStore, PageRequest},
    },
    utils::interaction_key::derive_interaction_key,
};

pub const DEFAULT_BOOKMARKS_PER_PAGE: usize = 20;
pub const MAX_BOOKMARKS_PER_PAGE: usize = 100;

/// Read side of the interaction engine. Never writes.
#[derive(Clone)]
pub struct InteractionQueryService {
    store: Arc<dyn InteractionStore>,
    default_per_page: usize,
    max_per_page: usize,
}

impl InteractionQueryService {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self {
            store,
            default_per_page: DEFAULT_BOOKMARKS_PER_PAGE,
            max_per_page: MAX_BOOKMARKS_PER_PAGE,
        }
    }

    pub fn with_page_limits(mut self, default_per_page: usize, max_per_page: usize) -> Self {
        self.max_per_page = max_per_page.max(1);
        self.default_per_page = default_per_page.clamp(1, self.max_per_page);
        self
    }

    /// The user's interaction with an item, `None` when they never interacted.
    pub async fn get_interaction(
        &self,
        item_id: &str,
        user_id: &str,
    ) -> Result<Option<InteractionRecord>, InteractionError> {
        require_id("item_id", item_id)?;
        require_id("user_id", user_id)?;

        let key = derive_interaction_key(item_id, user_id);
        Ok(self.store.get(&key).await?)
    }

    /// Interactions for several items at once, in input order, skipping items
    /// without a record. Duplicate ids are fetched once.
    pub async fn get_interactions(
        &self,
        item_ids: &[String],
        user_id: &str,
    ) -> Result<Vec<InteractionRecord>, InteractionError> {
        require_id("user_id", user_id)?;
        debug!("Looking up {} interactions for user {}", item_ids.len(), user_id);

        let mut seen = HashSet::new();
        let lookups = item_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|id| self.get_interaction(id, user_id));

        let found = try_join_all(lookups).await?;
        Ok(found.into_iter().flatten().collect())
    }

    /// Every bookmarked record of the user, most recently updated first.
    pub async fn list_bookmarks(
        &self,
        user_id: &str,
    ) -> Result<Vec<InteractionRecord>, InteractionError> {
        require_id("user_id", user_id)?;
        debug!("Listing all bookmarks for user: {}", user_id);

        let filter = InteractionFilter::bookmarked();
        let mut bookmarks = Vec::new();
        loop {
            let batch = self
                .store
                .query_by_user(
                    user_id,
                    &filter,
                    PageRequest::new(bookmarks.len(), self.max_per_page),
                )
                .await?;
            let exhausted = batch.len() < self.max_per_page;
            bookmarks.extend(batch);
            if exhausted {
                break;
            }
        }

        Ok(bookmarks)
    }

    /// One page of the user's bookmarks.
    pub async fn list_bookmarks_page(
        &self,
        user_id: &str,
        query: BookmarkQuery,
    ) -> Result<BookmarkPage, InteractionError> {
        require_id("user_id", user_id)?;

        let page = query.page.unwrap_or(1).max(1);
        let per_page = query
            .limit
            .unwrap_or(self.default_per_page)
            .clamp(1, self.max_per_page);
        debug!(
            "Getting bookmarks for user: {} (page {}, {} per page)",
            user_id, page, per_page
        );

        let offset = (page - 1)
            .checked_mul(per_page)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| {
                InteractionError::InvalidInput(format!("page {} is out of range", page))
            })?;

        let filter = InteractionFilter::bookmarked().with_item_type(query.item_type);
        // one extra row tells whether another page exists
        let mut data = self
            .store
            .query_by_user(user_id, &filter, PageRequest::new(offset, per_page + 1))
            .await?;

        let has_more = data.len() > per_page;
        data.truncate(per_page);

        Ok(BookmarkPage {
            data,
            page,
            per_page,
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interaction::{ContentType, VoteState};
    use crate::services::store::{MemoryInteractionStore, MockInteractionStore, StoreError};
    use chrono::{Duration, Utc};

    async fn seed(store: &MemoryInteractionStore, user: &str, items: &[(&str, ContentType, bool)]) {
        let start = Utc::now();
        for (i, (item, item_type, bookmarked)) in items.iter().enumerate() {
            let mut r = InteractionRecord::new(item, *item_type, user, start + Duration::seconds(i as i64));
            r.is_bookmarked = *bookmarked;
            store.put(&r).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_get_interaction_returns_none_when_missing() {
        let store = Arc::new(MemoryInteractionStore::new());
        let query = InteractionQueryService::new(store);
        assert_eq!(query.get_interaction("promo1", "userA").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_interaction_propagates_store_failure() {
        let mut store = MockInteractionStore::new();
        store
            .expect_get()
            .returning(|_| Err(StoreError::Internal("boom".into())));

        let query = InteractionQueryService::new(Arc::new(store));
        let err = query.get_interaction("promo1", "userA").await.unwrap_err();
        assert_eq!(err, InteractionError::Store(StoreError::Internal("boom".into())));
    }

    #[tokio::test]
    async fn test_get_interactions_keeps_order_and_skips_missing() {
        let store = Arc::new(MemoryInteractionStore::new());
        let mut voted = InteractionRecord::new("p2", ContentType::Post, "u", Utc::now());
        voted.vote_state = VoteState::Upvote;
        store.put(&voted).await.unwrap();
        seed(&store, "u", &[("p1", ContentType::Post, true)]).await;

        let query = InteractionQueryService::new(store);
        let ids = vec!["p2".to_string(), "missing".to_string(), "p1".to_string(), "p2".to_string()];
        let found = query.get_interactions(&ids, "u").await.unwrap();

        let found_ids: Vec<_> = found.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(found_ids, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn test_list_bookmarks_walks_every_page() {
        let store = Arc::new(MemoryInteractionStore::new());
        let items: Vec<String> = (0..7).map(|i| format!("promo{}", i)).collect();
        let seeded: Vec<_> = items
            .iter()
            .map(|id| (id.as_str(), ContentType::PromoCode, true))
            .collect();
        seed(&store, "userB", &seeded).await;
        seed(&store, "userB", &[("skip", ContentType::PromoCode, false)]).await;

        let query = InteractionQueryService::new(store).with_page_limits(2, 3);
        let all = query.list_bookmarks("userB").await.unwrap();

        assert_eq!(all.len(), 7);
        assert_eq!(all[0].item_id, "promo6");
        assert_eq!(all[6].item_id, "promo0");
    }

    #[tokio::test]
    async fn test_list_bookmarks_page_reports_has_more_and_filters() {
        let store = Arc::new(MemoryInteractionStore::new());
        seed(
            &store,
            "userB",
            &[
                ("p1", ContentType::Post, true),
                ("c1", ContentType::Comment, true),
                ("p2", ContentType::Post, true),
                ("p3", ContentType::Post, true),
            ],
        )
        .await;

        let query = InteractionQueryService::new(store);

        let first = query
            .list_bookmarks_page(
                "userB",
                BookmarkQuery {
                    page: Some(1),
                    limit: Some(2),
                    item_type: Some(ContentType::Post),
                },
            )
            .await
            .unwrap();
        let ids: Vec<_> = first.data.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "p2"]);
        assert!(first.has_more);

        let second = query
            .list_bookmarks_page(
                "userB",
                BookmarkQuery {
                    page: Some(2),
                    limit: Some(2),
                    item_type: Some(ContentType::Post),
                },
            )
            .await
            .unwrap();
        assert_eq!(second.data.len(), 1);
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn test_list_bookmarks_page_rejects_out_of_range_page() {
        let mut store = MockInteractionStore::new();
        store.expect_query_by_user().never();

        let query = InteractionQueryService::new(Arc::new(store));
        let err = query
            .list_bookmarks_page(
                "userB",
                BookmarkQuery {
                    page: Some(usize::MAX),
                    limit: Some(100),
                    item_type: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InteractionError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_whitespace_user_id_is_a_valid_identity() {
        let store = Arc::new(MemoryInteractionStore::new());
        let mut record = InteractionRecord::new("p1", ContentType::Post, " ", Utc::now());
        record.is_bookmarked = true;
        store.put(&record).await.unwrap();

        let query = InteractionQueryService::new(store);
        assert_eq!(query.get_interaction("p1", " ").await.unwrap(), Some(record));
        assert_eq!(query.list_bookmarks(" ").await.unwrap().len(), 1);
        assert!(matches!(
            query.get_interaction("p1", "").await,
            Err(InteractionError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_list_bookmarks_page_clamps_limits() {
        let store = Arc::new(MemoryInteractionStore::new());
        let query = InteractionQueryService::new(store);

        let page = query
            .list_bookmarks_page(
                "userB",
                BookmarkQuery {
                    page: Some(0),
                    limit: Some(10_000),
                    item_type: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, MAX_BOOKMARKS_PER_PAGE);
        assert!(page.data.is_empty());
    }
}
