use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use super::{listing_order, InteractionFilter, InteractionStore, PageRequest, StoreError};
use crate::models::interaction::InteractionRecord;

/// 基于 DashMap 的内存存储，每个键上的读写都是原子的单文档操作
#[derive(Debug, Clone, Default)]
pub struct MemoryInteractionStore {
    records: Arc<DashMap<String, InteractionRecord>>,
}

impl MemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前存储的记录数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl InteractionStore for MemoryInteractionStore {
    async fn get(&self, key: &str) -> Result<Option<InteractionRecord>, StoreError> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, record: &InteractionRecord) -> Result<(), StoreError> {
        debug!("Storing interaction record {}", record.document_key);
        self.records
            .insert(record.document_key.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.records.remove(key) {
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
        let mut matching: Vec<InteractionRecord> = self
            .records
            .iter()
            .filter(|entry| entry.user_id == user_id && filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        matching.sort_by(listing_order);

        Ok(matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }
}
