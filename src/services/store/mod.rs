//! Persistence seam for interaction records.
//!
//! Every method is a single-document (or single-query) operation. Callers that
//! need read-modify-write compose `get` and `put` themselves; the pair is not
//! atomic and concurrent writers on the same key resolve last-writer-wins.
use async_trait::async_trait;
use std::cmp::Ordering;
use thiserror::Error;

use crate::models::interaction::{ContentType, InteractionRecord};

pub mod memory;
pub mod surreal;

pub use memory::MemoryInteractionStore;
pub use surreal::SurrealInteractionStore;

/// Failures reported by an [`InteractionStore`] backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether the caller may reasonably retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict(_) | StoreError::Unavailable(_) | StoreError::Internal(_)
        )
    }
}

/// Restricts [`InteractionStore::query_by_user`] results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionFilter {
    pub bookmarked_only: bool,
    pub item_type: Option<ContentType>,
}

impl InteractionFilter {
    pub fn bookmarked() -> Self {
        Self {
            bookmarked_only: true,
            item_type: None,
        }
    }

    pub fn with_item_type(mut self, item_type: Option<ContentType>) -> Self {
        self.item_type = item_type;
        self
    }

    pub fn matches(&self, record: &InteractionRecord) -> bool {
        (!self.bookmarked_only || record.is_bookmarked)
            && self.item_type.map_or(true, |t| t == record.item_type)
    }
}

/// Offset/limit window over an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

/// Listing order shared by every backend: newest `updated_at` first, then `item_id` ascending.
pub fn listing_order(a: &InteractionRecord, b: &InteractionRecord) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// Key-addressed store of [`InteractionRecord`]s.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Reads the record stored under `key`, `None` when there is none.
    async fn get(&self, key: &str) -> Result<Option<InteractionRecord>, StoreError>;

    /// Replaces the whole record stored under `record.document_key`.
    async fn put(&self, record: &InteractionRecord) -> Result<(), StoreError>;

    /// Removes the record under `key`; `StoreError::NotFound` when absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Records owned by `user_id` matching `filter`, in [`listing_order`].
    async fn query_by_user(
        &self,
        user_id: &str,
        filter: &InteractionFilter,
        page: PageRequest,
    ) -> Result<Vec<InteractionRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_listing_order_breaks_ties_by_item_id() {
        let now = Utc::now();
        let a = InteractionRecord::new("a", ContentType::Post, "u", now);
        let b = InteractionRecord::new("b", ContentType::Post, "u", now);
        let newer = InteractionRecord::new("z", ContentType::Post, "u", now + Duration::seconds(1));

        let mut records = vec![b.clone(), a.clone(), newer.clone()];
        records.sort_by(listing_order);

        let ids: Vec<_> = records.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "b"]);
    }

    #[test]
    fn test_filter_matches() {
        let now = Utc::now();
        let mut record = InteractionRecord::new("c1", ContentType::Comment, "u", now);

        assert!(InteractionFilter::default().matches(&record));
        assert!(!InteractionFilter::bookmarked().matches(&record));

        record.is_bookmarked = true;
        assert!(InteractionFilter::bookmarked().matches(&record));
        assert!(!InteractionFilter::bookmarked()
            .with_item_type(Some(ContentType::Post))
            .matches(&record));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::Unavailable("down".into()).is_retryable());
        assert!(StoreError::Conflict("race".into()).is_retryable());
        assert!(!StoreError::PermissionDenied("rules".into()).is_retryable());
        assert!(!StoreError::NotFound("k".into()).is_retryable());
    }
}
