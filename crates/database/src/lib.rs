//! # Customizer Database Crate
//!
//! This crate acts as the application's only interface to the MySQL store that
//! holds order customizations, categories and ingredients.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The web layer sees the [`CustomizationStore`]
//!   trait and never a driver type.
//! - **Bound parameters only:** Every statement is a fixed template from
//!   [`queries`]; caller values are bound to its placeholders.
//! - **One connection, one statement:** Each operation acquires a pooled
//!   connection, runs a single statement under a deadline and releases the
//!   connection on every exit path.
//!
//! ## Public API
//!
//! - `DbPool`: the connection pool manager (`connect`, `acquire`, `release`, `status`).
//! - `DbRepository`: the `CustomizationStore` implementation over a `DbPool`.
//! - `Record`: a decoded row, as a JSON object keyed by column name.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod pool;
pub mod queries;
pub mod repository;
pub mod row;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use error::DbError;
pub use pool::{DbPool, PoolStatus, PooledConnection};
pub use repository::DbRepository;
pub use row::Record;
pub use store::CustomizationStore;
