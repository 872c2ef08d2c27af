use crate::error::DbError;
use crate::pool::PoolStatus;
use crate::row::Record;
use async_trait::async_trait;
use core_types::{CategoryKey, CustomizationDraft, RecordId};

/// Everything the HTTP handlers need from the store.
///
/// Each method is one acquire, statement, release cycle. The production
/// implementation is [`crate::DbRepository`]; tests substitute an in-memory store.
#[async_trait]
pub trait CustomizationStore: Send + Sync + 'static {
    /// All rows of `OrderCustomizations`.
    async fn list_customizations(&self) -> Result<Vec<Record>, DbError>;

    /// Ingredient-bearing categories below the root level, ordered by level.
    async fn list_customizable_categories(&self) -> Result<Vec<Record>, DbError>;

    /// Ingredients of one category. An unknown or non-integer key yields an empty list.
    async fn list_ingredients_by_category(
        &self,
        category: &CategoryKey,
    ) -> Result<Vec<Record>, DbError>;

    /// Inserts a customization and returns the id the store generated for it.
    async fn create_customization(&self, draft: &CustomizationDraft) -> Result<RecordId, DbError>;

    /// Overwrites both references of one customization. Returns the affected-row count the store reports.
    async fn update_customization(
        &self,
        id: RecordId,
        draft: &CustomizationDraft,
    ) -> Result<u64, DbError>;

    /// Removes one customization. Returns the number of rows deleted.
    async fn delete_customization(&self, id: RecordId) -> Result<u64, DbError>;

    /// Round-trips a trivial statement to prove the store is reachable.
    async fn ping(&self) -> Result<(), DbError>;

    fn pool_status(&self) -> PoolStatus;
}
