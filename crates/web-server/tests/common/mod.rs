//! An in-memory `CustomizationStore` backed by a fake, semaphore-bounded pool.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use configuration::{ApiSettings, ServerSettings};
use core_types::{CategoryKey, CustomizationDraft, RecordId};
use database::{CustomizationStore, DbError, PoolStatus, Record};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};
use tower::ServiceExt;
use web_server::{build_router, AppState};

/// What the next statements should fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// A statement-level error the store cannot classify.
    Statement,
    /// The statement missed its deadline.
    Deadline,
}

impl Failure {
    fn error(self) -> DbError {
        match self {
            Failure::Statement => DbError::Decode {
                column: "OrderID".to_string(),
                reason: "induced failure".to_string(),
            },
            Failure::Deadline => DbError::QueryTimeout(Duration::from_millis(10)),
        }
    }
}

#[derive(Default)]
struct Tables {
    customizations: Vec<(i64, i64, i64)>,
    next_id: i64,
    categories: Vec<Record>,
    ingredients: Vec<Record>,
}

pub struct MemoryStore {
    slots: Semaphore,
    max_connections: u32,
    in_use: AtomicU32,
    peak: AtomicU32,
    acquired: AtomicU64,
    released: AtomicU64,
    latency: Duration,
    failure: Mutex<Option<Failure>>,
    tables: Mutex<Tables>,
}

struct Lease<'a> {
    store: &'a MemoryStore,
    _permit: SemaphorePermit<'a>,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.store.in_use.fetch_sub(1, Ordering::SeqCst);
        self.store.released.fetch_add(1, Ordering::SeqCst);
    }
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

impl MemoryStore {
    pub fn new(max_connections: u32) -> Self {
        Self::with_latency(max_connections, Duration::ZERO)
    }

    pub fn with_latency(max_connections: u32, latency: Duration) -> Self {
        let tables = Tables {
            next_id: 1,
            categories: vec![
                record(json!({ "CategoryID": 1, "CategoryName": "Menu", "isIngredient": "yes", "level": 0 })),
                record(json!({ "CategoryID": 4, "CategoryName": "Cheese", "isIngredient": "yes", "level": 2 })),
                record(json!({ "CategoryID": 2, "CategoryName": "Drinks", "isIngredient": "no", "level": 1 })),
                record(json!({ "CategoryID": 3, "CategoryName": "Sauces", "isIngredient": "yes", "level": 1 })),
            ],
            ingredients: vec![
                record(json!({ "IngredientID": 10, "CategoryID": 3, "IngredientName": "Tomato" })),
                record(json!({ "IngredientID": 11, "CategoryID": 3, "IngredientName": "Pesto" })),
                record(json!({ "IngredientID": 12, "CategoryID": 4, "IngredientName": "Mozzarella" })),
            ],
            ..Tables::default()
        };

        Self {
            slots: Semaphore::new(max_connections as usize),
            max_connections,
            in_use: AtomicU32::new(0),
            peak: AtomicU32::new(0),
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
            latency,
            failure: Mutex::new(None),
            tables: Mutex::new(tables),
        }
    }

    pub fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn in_use(&self) -> u32 {
        self.in_use.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> u32 {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    async fn acquire(&self) -> Lease<'_> {
        let permit = self.slots.acquire().await.expect("semaphore closed");
        let now = self.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Lease {
            store: self,
            _permit: permit,
        }
    }

    /// One acquire, statement, release cycle against the tables.
    async fn statement<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, DbError> {
        let _lease = self.acquire().await;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let failure = *self.failure.lock().unwrap();
        if let Some(failure) = failure {
            return Err(failure.error());
        }
        let mut tables = self.tables.lock().unwrap();
        Ok(f(&mut tables))
    }
}

#[async_trait]
impl CustomizationStore for MemoryStore {
    async fn list_customizations(&self) -> Result<Vec<Record>, DbError> {
        self.statement(|t| {
            t.customizations
                .iter()
                .map(|(id, order, ingredient)| {
                    record(json!({
                        "OrderCustomizationID": id,
                        "OrderID": order,
                        "IngredientID": ingredient,
                    }))
                })
                .collect()
        })
        .await
    }

    async fn list_customizable_categories(&self) -> Result<Vec<Record>, DbError> {
        self.statement(|t| {
            let level = |r: &Record| r.get("level").and_then(Value::as_i64).unwrap_or(0);
            let mut rows: Vec<Record> = t
                .categories
                .iter()
                .filter(|r| r.get("isIngredient") == Some(&json!("yes")) && level(r) > 0)
                .cloned()
                .collect();
            rows.sort_by_key(level);
            rows
        })
        .await
    }

    async fn list_ingredients_by_category(
        &self,
        category: &CategoryKey,
    ) -> Result<Vec<Record>, DbError> {
        self.statement(|t| match category {
            CategoryKey::Id(id) => t
                .ingredients
                .iter()
                .filter(|r| r.get("CategoryID") == Some(&json!(id.get())))
                .cloned()
                .collect(),
            CategoryKey::Raw(_) => Vec::new(),
        })
        .await
    }

    async fn create_customization(&self, draft: &CustomizationDraft) -> Result<RecordId, DbError> {
        let draft = *draft;
        self.statement(move |t| {
            let id = t.next_id;
            t.next_id += 1;
            t.customizations
                .push((id, draft.order_id.get(), draft.ingredient_id.get()));
            RecordId::new(id)
        })
        .await
    }

    async fn update_customization(
        &self,
        id: RecordId,
        draft: &CustomizationDraft,
    ) -> Result<u64, DbError> {
        let draft = *draft;
        self.statement(move |t| {
            let mut matched = 0;
            for row in t.customizations.iter_mut().filter(|row| row.0 == id.get()) {
                row.1 = draft.order_id.get();
                row.2 = draft.ingredient_id.get();
                matched += 1;
            }
            matched
        })
        .await
    }

    async fn delete_customization(&self, id: RecordId) -> Result<u64, DbError> {
        self.statement(move |t| {
            let before = t.customizations.len();
            t.customizations.retain(|row| row.0 != id.get());
            (before - t.customizations.len()) as u64
        })
        .await
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.statement(|_| ()).await
    }

    fn pool_status(&self) -> PoolStatus {
        let in_use = self.in_use();
        PoolStatus {
            size: self.max_connections,
            idle: (self.max_connections - in_use) as usize,
            in_use,
            max_connections: self.max_connections,
        }
    }
}

pub fn app(store: Arc<MemoryStore>, api: ApiSettings, mount_path: &str) -> Router {
    let server = ServerSettings {
        mount_path: mount_path.to_string(),
        ..ServerSettings::default()
    };
    build_router(AppState::new(store, api), &server)
}

/// Sends one request through the router and decodes the JSON response body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Sends a raw body with the JSON content type.
pub async fn send_raw(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
