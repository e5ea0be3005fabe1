use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    models::interaction::{ContentType, InteractionRecord, TombstonePolicy, VoteState},
    services::{
        store::{InteractionStore, StoreError},
        vote::next_vote_state,
    },
    utils::{
        clock::{Clock, SystemClock},
        interaction_key::derive_interaction_key,
    },
};

/// Errors returned by the toggle engine and the query facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub(crate) fn require_id(field: &str, value: &str) -> Result<(), InteractionError> {
    if value.is_empty() {
        return Err(InteractionError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Vote and bookmark toggles over an [`InteractionStore`].
///
/// Every toggle is a read-modify-write of the single record for the
/// (item, user) pair. The next state is always derived from what is stored, so
/// repeating a toggle converges instead of drifting. The get/put pair is not
/// atomic: concurrent toggles on the same pair resolve last-writer-wins.
#[derive(Clone)]
pub struct InteractionService {
    store: Arc<dyn InteractionStore>,
    clock: Arc<dyn Clock>,
    tombstone_policy: TombstonePolicy,
}

impl InteractionService {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            tombstone_policy: TombstonePolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_tombstone_policy(mut self, policy: TombstonePolicy) -> Self {
        self.tombstone_policy = policy;
        self
    }

    pub fn tombstone_policy(&self) -> TombstonePolicy {
        self.tombstone_policy
    }

    pub async fn toggle_vote(
        &self,
        item_id: &str,
        item_type: ContentType,
        user_id: &str,
        requested: VoteState,
    ) -> Result<InteractionRecord, InteractionError> {
        debug!(
            "Toggling vote {} on {} {} for user {}",
            requested, item_type, item_id, user_id
        );

        self.apply(item_id, item_type, user_id, |record| {
            record.vote_state = next_vote_state(record.vote_state, requested);
        })
        .await
    }

    pub async fn toggle_bookmark(
        &self,
        item_id: &str,
        item_type: ContentType,
        user_id: &str,
        is_bookmarked: bool,
    ) -> Result<InteractionRecord, InteractionError> {
        debug!(
            "Setting bookmark={} on {} {} for user {}",
            is_bookmarked, item_type, item_id, user_id
        );

        self.apply(item_id, item_type, user_id, |record| {
            record.is_bookmarked = is_bookmarked;
        })
        .await
    }

    async fn apply<F>(
        &self,
        item_id: &str,
        item_type: ContentType,
        user_id: &str,
        mutate: F,
    ) -> Result<InteractionRecord, InteractionError>
    where
        F: FnOnce(&mut InteractionRecord),
    {
        require_id("item_id", item_id)?;
        require_id("user_id", user_id)?;

        let key = derive_interaction_key(item_id, user_id);
        let existing = self.store.get(&key).await?;
        let existed = existing.is_some();

        let mut record = match existing {
            Some(record) => {
                if record.item_id != item_id || record.user_id != user_id {
                    warn!(
                        "Key {} is shared by ({}, {}) and ({}, {})",
                        key, record.item_id, record.user_id, item_id, user_id
                    );
                }
                if record.item_type != item_type {
                    warn!(
                        "Item {} is stored as {} but was toggled as {}; keeping {}",
                        record.item_id, record.item_type, item_type, record.item_type
                    );
                }
                record
            }
            None => InteractionRecord::new(item_id, item_type, user_id, self.clock.now()),
        };

        mutate(&mut record);
        record.touch(self.clock.now());

        if record.is_inactive() && self.tombstone_policy == TombstonePolicy::Delete {
            if existed {
                match self.store.delete(&key).await {
                    Ok(()) => debug!("Deleted inactive interaction {}", key),
                    // already removed by a concurrent toggle
                    Err(StoreError::NotFound(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            return Ok(record);
        }

        self.store.put(&record).await?;
        Ok(record)
    }
}
