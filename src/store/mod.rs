//! Persistence contract for subscription records.
//!
//! The service layer only talks to [`SubscriptionStore`]; the Postgres
//! implementation backs the running server and the in-memory one backs tests
//! and local experiments.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ListFilter, NewSubscription, Subscription};

pub mod memory;
pub mod postgres;

pub use memory::InMemorySubscriptionStore;
pub use postgres::PgSubscriptionStore;

#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with the given id, including updates/deletes that touched zero rows.
    #[error("Not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn create(&self, data: NewSubscription) -> StoreResult<i64>;

    async fn get_by_id(&self, id: i64) -> StoreResult<Subscription>;

    /// Full replace of the record identified by `data.id`.
    async fn update(&self, data: &Subscription) -> StoreResult<()>;

    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Matching records, newest id first. Pagination applies only when set.
    async fn list(&self, filter: &ListFilter) -> StoreResult<Vec<Subscription>>;
}
