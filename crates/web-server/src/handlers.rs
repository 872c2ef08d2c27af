use crate::error::{AppError, Operation};
use crate::extractors::{CategoryParam, ValidCustomization, ValidId};
use crate::AppState;
use axum::{extract::State, Json};
use core_types::RecordId;
use database::{DbError, PoolStatus, Record};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pool: PoolStatus,
}

impl AppState {
    fn store_error(&self, operation: Operation) -> impl FnOnce(DbError) -> AppError {
        let legacy_status = self.api.legacy_error_status;
        move |source| AppError::Store {
            operation,
            source,
            legacy_status,
        }
    }

    /// Zero-row mutations succeed unless strict mode is on.
    fn check_matched(&self, operation: Operation, id: RecordId, rows: u64) -> Result<(), AppError> {
        if rows > 0 {
            return Ok(());
        }
        tracing::debug!(%operation, %id, "Statement matched no rows.");
        if self.api.strict_mutations {
            return Err(AppError::NotFound("Order customization not found".to_string()));
        }
        Ok(())
    }
}

/// # GET /ordercustomizations
pub async fn list_customizations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, AppError> {
    let rows = state
        .store
        .list_customizations()
        .await
        .map_err(state.store_error(Operation::ListCustomizations))?;
    Ok(Json(rows))
}

/// # GET /customize-categories
/// Ingredient-bearing categories below the root level, shallowest first.
pub async fn list_customizable_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, AppError> {
    let rows = state
        .store
        .list_customizable_categories()
        .await
        .map_err(state.store_error(Operation::ListCategories))?;
    Ok(Json(rows))
}

/// # GET /customize-categories/:CategoryID
/// An unknown or malformed category is an empty list, not an error.
pub async fn list_ingredients_by_category(
    State(state): State<Arc<AppState>>,
    CategoryParam(category): CategoryParam,
) -> Result<Json<Vec<Record>>, AppError> {
    let rows = state
        .store
        .list_ingredients_by_category(&category)
        .await
        .map_err(state.store_error(Operation::ListIngredients))?;
    Ok(Json(rows))
}

/// # POST /ordercustomizations
pub async fn create_customization(
    State(state): State<Arc<AppState>>,
    ValidCustomization(draft): ValidCustomization,
) -> Result<Json<MessageResponse>, AppError> {
    let id = state
        .store
        .create_customization(&draft)
        .await
        .map_err(state.store_error(Operation::CreateCustomization))?;
    tracing::info!(
        %id,
        order_id = %draft.order_id,
        ingredient_id = %draft.ingredient_id,
        "Order customization added."
    );
    Ok(Json(MessageResponse {
        message: "Order customization added successfully",
    }))
}

/// # PUT /ordercustomizations/:id
pub async fn update_customization(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    ValidCustomization(draft): ValidCustomization,
) -> Result<Json<MessageResponse>, AppError> {
    let rows = state
        .store
        .update_customization(id, &draft)
        .await
        .map_err(state.store_error(Operation::UpdateCustomization))?;
    state.check_matched(Operation::UpdateCustomization, id, rows)?;
    Ok(Json(MessageResponse {
        message: "Order customization updated successfully",
    }))
}

/// # DELETE /ordercustomizations/:id
pub async fn delete_customization(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<MessageResponse>, AppError> {
    let rows = state
        .store
        .delete_customization(id)
        .await
        .map_err(state.store_error(Operation::DeleteCustomization))?;
    state.check_matched(Operation::DeleteCustomization, id, rows)?;
    Ok(Json(MessageResponse {
        message: "Order customization deleted successfully",
    }))
}

/// # GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    state
        .store
        .ping()
        .await
        .map_err(state.store_error(Operation::Health))?;
    Ok(Json(HealthResponse {
        status: "ok",
        pool: state.store.pool_status(),
    }))
}

/// Anything outside the routes above.
pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
