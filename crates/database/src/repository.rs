use crate::error::DbError;
use crate::pool::{DbPool, PoolStatus};
use crate::queries;
use crate::row::{Record, row_to_record};
use crate::store::CustomizationStore;
use async_trait::async_trait;
use core_types::{CategoryKey, CustomizationDraft, RecordId};

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
///
/// Every method holds exactly one pooled connection for exactly one statement
/// and hands it back through [`DbPool::release`] before looking at the outcome.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: DbPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CustomizationStore for DbRepository {
    async fn list_customizations(&self) -> Result<Vec<Record>, DbError> {
        let mut conn = self.pool.acquire().await?;
        let outcome = self
            .pool
            .bounded(sqlx::query(queries::LIST_CUSTOMIZATIONS).fetch_all(&mut *conn))
            .await;
        self.pool.release(conn, &outcome);

        outcome?.iter().map(row_to_record).collect()
    }

    async fn list_customizable_categories(&self) -> Result<Vec<Record>, DbError> {
        let mut conn = self.pool.acquire().await?;
        let outcome = self
            .pool
            .bounded(
                sqlx::query(queries::LIST_CUSTOMIZABLE_CATEGORIES)
                    .bind(queries::INGREDIENT_FLAG)
                    .fetch_all(&mut *conn),
            )
            .await;
        self.pool.release(conn, &outcome);

        outcome?.iter().map(row_to_record).collect()
    }

    async fn list_ingredients_by_category(
        &self,
        category: &CategoryKey,
    ) -> Result<Vec<Record>, DbError> {
        let query = sqlx::query(queries::LIST_INGREDIENTS_BY_CATEGORY);
        let query = match category {
            CategoryKey::Id(id) => query.bind(id.get()),
            CategoryKey::Raw(raw) => query.bind(raw.as_str()),
        };

        let mut conn = self.pool.acquire().await?;
        let outcome = self.pool.bounded(query.fetch_all(&mut *conn)).await;
        self.pool.release(conn, &outcome);

        outcome?.iter().map(row_to_record).collect()
    }

    async fn create_customization(&self, draft: &CustomizationDraft) -> Result<RecordId, DbError> {
        let mut conn = self.pool.acquire().await?;
        let outcome = self
            .pool
            .bounded(
                sqlx::query(queries::INSERT_CUSTOMIZATION)
                    .bind(draft.order_id.get())
                    .bind(draft.ingredient_id.get())
                    .execute(&mut *conn),
            )
            .await;
        self.pool.release(conn, &outcome);

        let inserted_id = outcome?.last_insert_id();
        let id = i64::try_from(inserted_id).map_err(|_| DbError::Decode {
            column: "OrderCustomizationID".to_string(),
            reason: format!("generated id {} does not fit in a signed 64-bit integer", inserted_id),
        })?;
        Ok(RecordId::new(id))
    }

    async fn update_customization(
        &self,
        id: RecordId,
        draft: &CustomizationDraft,
    ) -> Result<u64, DbError> {
        let mut conn = self.pool.acquire().await?;
        let outcome = self
            .pool
            .bounded(
                sqlx::query(queries::UPDATE_CUSTOMIZATION)
                    .bind(draft.order_id.get())
                    .bind(draft.ingredient_id.get())
                    .bind(id.get())
                    .execute(&mut *conn),
            )
            .await;
        self.pool.release(conn, &outcome);

        Ok(outcome?.rows_affected())
    }

    async fn delete_customization(&self, id: RecordId) -> Result<u64, DbError> {
        let mut conn = self.pool.acquire().await?;
        let outcome = self
            .pool
            .bounded(
                sqlx::query(queries::DELETE_CUSTOMIZATION)
                    .bind(id.get())
                    .execute(&mut *conn),
            )
            .await;
        self.pool.release(conn, &outcome);

        Ok(outcome?.rows_affected())
    }

    async fn ping(&self) -> Result<(), DbError> {
        let mut conn = self.pool.acquire().await?;
        let outcome = self
            .pool
            .bounded(sqlx::query(queries::PING).execute(&mut *conn))
            .await;
        self.pool.release(conn, &outcome);

        outcome.map(|_| ())
    }

    fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }
}
