//! Extractors that validate path identifiers and customization bodies before a
//! handler touches the store.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use core_types::{CategoryKey, CoreError, CustomizationDraft, CustomizationPayload, RecordId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AppError;
use crate::AppState;

/// The single integer identifier in the route path (`:id`).
/// Validation errors name the route parameter.
#[derive(Debug, Clone, Copy)]
pub struct ValidId(pub RecordId);

#[async_trait]
impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params): Path<HashMap<String, String>> =
            Path::from_request_parts(parts, state)
                .await
                .map_err(|e| CoreError::InvalidInput("path".to_string(), e.body_text()))?;

        let (field, raw) = params
            .iter()
            .next()
            .ok_or_else(|| CoreError::MissingField("id".to_string()))?;

        Ok(Self(RecordId::parse_field(field, raw)?))
    }
}

/// The `:CategoryID` segment. Non-integer values pass through to the store
/// unless `api.strict_validation` is set.
#[derive(Debug, Clone)]
pub struct CategoryParam(pub CategoryKey);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CategoryParam {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| CoreError::InvalidInput("path".to_string(), e.body_text()))?;

        let key = if state.api.strict_validation {
            CategoryKey::strict(&raw)?
        } else {
            CategoryKey::lenient(&raw)
        };
        Ok(Self(key))
    }
}

/// A JSON `{OrderID, IngredientID}` body with both identifiers present and integral.
#[derive(Debug, Clone, Copy)]
pub struct ValidCustomization(pub CustomizationDraft);

#[async_trait]
impl<S> FromRequest<S> for ValidCustomization
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload): Json<CustomizationPayload> = Json::from_request(req, state)
            .await
            .map_err(|rejection| CoreError::InvalidInput("body".to_string(), rejection.body_text()))?;

        Ok(Self(payload.validate()?))
    }
}
