use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use crate::utils::interaction_key::derive_interaction_key;

/// Kinds of content a user can vote on or bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    PromoCode,
    Post,
    Comment,
    Service,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::PromoCode => "PROMO_CODE",
            ContentType::Post => "POST",
            ContentType::Comment => "COMMENT",
            ContentType::Service => "SERVICE",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROMO_CODE" => Ok(ContentType::PromoCode),
            "POST" => Ok(ContentType::Post),
            "COMMENT" => Ok(ContentType::Comment),
            "SERVICE" => Ok(ContentType::Service),
            other => Err(UnknownVariant::new("content type", other)),
        }
    }
}

/// A user's vote on a single item. Also used as the requested action for a
/// vote toggle, where `None` means "remove my vote".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteState {
    #[default]
    None,
    Upvote,
    Downvote,
}

impl VoteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteState::None => "NONE",
            VoteState::Upvote => "UPVOTE",
            VoteState::Downvote => "DOWNVOTE",
        }
    }
}

impl fmt::Display for VoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(VoteState::None),
            "UPVOTE" => Ok(VoteState::Upvote),
            "DOWNVOTE" => Ok(VoteState::Downvote),
            other => Err(UnknownVariant::new("vote state", other)),
        }
    }
}

/// Raised when a persisted or submitted enum string is not part of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// What to do with a record once its vote is `None` and it is not bookmarked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TombstonePolicy {
    /// Keep the record as a no-op tombstone.
    #[default]
    Retain,
    /// Physically delete the record.
    Delete,
}

impl FromStr for TombstonePolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "retain" => Ok(TombstonePolicy::Retain),
            "delete" => Ok(TombstonePolicy::Delete),
            _ => Err(UnknownVariant::new("tombstone policy", s)),
        }
    }
}

/// The single persisted interaction between one user and one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub document_key: String,
    pub item_id: String,
    pub item_type: ContentType,
    pub user_id: String,
    pub vote_state: VoteState,
    pub is_bookmarked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InteractionRecord {
    /// Builds the in-memory default for a pair that has no stored record yet.
    pub fn new(item_id: &str, item_type: ContentType, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            document_key: derive_interaction_key(item_id, user_id),
            item_id: item_id.to_string(),
            item_type,
            user_id: user_id.to_string(),
            vote_state: VoteState::None,
            is_bookmarked: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// `true` when the record carries no vote and no bookmark.
    pub fn is_inactive(&self) -> bool {
        self.vote_state == VoteState::None && !self.is_bookmarked
    }

    /// Refreshes `updated_at`, never letting it fall behind `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ToggleVoteRequest {
    #[validate(length(min = 1, max = 512))]
    pub item_id: String,
    pub item_type: ContentType,
    pub vote: VoteState,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ToggleBookmarkRequest {
    #[validate(length(min = 1, max = 512))]
    pub item_id: String,
    pub item_type: ContentType,
    pub is_bookmarked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InteractionLookupRequest {
    #[validate(length(min = 1, max = 100))]
    pub item_ids: Vec<String>,
}

/// Pagination and filtering for the bookmark listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub item_type: Option<ContentType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkPage {
    pub data: Vec<InteractionRecord>,
    pub page: usize,
    pub per_page: usize,
    pub has_more: bool,
}
