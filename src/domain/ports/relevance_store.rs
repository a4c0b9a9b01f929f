use async_trait::async_trait;

use crate::domain::errors::RelevanceError;
use crate::domain::models::{ActivityId, FetchOutcome, UserId};

/// Remote source of truth for relevance records
#[async_trait]
pub trait RelevanceStore: Send + Sync {
    /// Read the record for a (user, activity) pair
    async fn fetch_state(
        &self,
        user_id: &UserId,
        activity_id: &ActivityId,
    ) -> Result<FetchOutcome, RelevanceError>;

    /// Write the record for a (user, activity) pair
    async fn push_state(
        &self,
        user_id: &UserId,
        activity_id: &ActivityId,
        relevant: bool,
    ) -> Result<(), RelevanceError>;
}
