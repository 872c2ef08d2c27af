use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_types::{CoreError, FailureKind};
use database::DbError;
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// The store-backed operations the API exposes. Each one carries the generic
/// message a caller sees when the operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListCustomizations,
    ListCategories,
    ListIngredients,
    CreateCustomization,
    UpdateCustomization,
    DeleteCustomization,
    Health,
}

impl Operation {
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::ListCustomizations => "An error occurred while fetching order customizations",
            Operation::ListCategories => "An error occurred while fetching categories",
            Operation::ListIngredients => "An error occurred while fetching the ingredients",
            Operation::CreateCustomization => "An error occurred while adding the order customization",
            Operation::UpdateCustomization => {
                "An error occurred while updating the order customization"
            }
            Operation::DeleteCustomization => {
                "An error occurred while deleting the order customization"
            }
            Operation::Health => "The database is unavailable",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ListCustomizations => "list order customizations",
            Operation::ListCategories => "list categories",
            Operation::ListIngredients => "list ingredients",
            Operation::CreateCustomization => "add order customization",
            Operation::UpdateCustomization => "update order customization",
            Operation::DeleteCustomization => "delete order customization",
            Operation::Health => "health check",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(#[from] CoreError),

    #[error("Failed to {operation}: {source}")]
    Store {
        operation: Operation,
        #[source]
        source: DbError,
        /// Report 500 whatever the failure kind.
        legacy_status: bool,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::Validation(_) => FailureKind::Invalid,
            AppError::Store { source, .. } => source.kind(),
            AppError::NotFound(_) => FailureKind::NotFound,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store {
                legacy_status: true,
                ..
            } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => status_for(self.kind()),
        }
    }
}

pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Invalid => StatusCode::BAD_REQUEST,
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::Conflict => StatusCode::CONFLICT,
        FailureKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Store failures are logged in full; the caller only ever sees the
/// operation's generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::Validation(err) => err.to_string(),
            AppError::NotFound(message) => message.clone(),
            AppError::Store {
                operation, source, ..
            } => {
                let kind = source.kind();
                if kind.is_transient() {
                    tracing::warn!(%operation, %kind, error = %source, "Store unavailable.");
                } else {
                    tracing::error!(%operation, %kind, error = ?source, "Store error.");
                }
                operation.failure_message().to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn store_error(source: DbError, legacy_status: bool) -> AppError {
        AppError::Store {
            operation: Operation::CreateCustomization,
            source,
            legacy_status,
        }
    }

    #[tokio::test]
    async fn validation_error_is_400_with_its_message() {
        let err = AppError::from(CoreError::MissingField("OrderID".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Missing required field: OrderID"
        );
    }

    #[tokio::test]
    async fn store_errors_hide_details_behind_the_operation_message() {
        let err = store_error(decode_error(), false);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "An error occurred while adding the order customization"
        );
    }

    #[tokio::test]
    async fn unavailable_store_is_503_unless_legacy() {
        let response = store_error(deadline_error(), false).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = store_error(deadline_error(), true).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn every_kind_has_a_distinct_status() {
        let statuses = [
            status_for(FailureKind::Invalid),
            status_for(FailureKind::NotFound),
            status_for(FailureKind::Conflict),
            status_for(FailureKind::Unavailable),
            status_for(FailureKind::Internal),
        ];
        for (i, a) in statuses.iter().enumerate() {
            for b in &statuses[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    fn deadline_error() -> DbError {
        DbError::QueryTimeout(std::time::Duration::from_secs(1))
    }

    fn decode_error() -> DbError {
        DbError::Decode {
            column: "OrderID".into(),
            reason: "unexpected type".into(),
        }
    }
}
