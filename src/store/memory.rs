use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, SubscriptionStore};
use crate::models::{ListFilter, NewSubscription, Subscription};

#[derive(Default)]
struct Inner {
    next_id: i64,
    records: BTreeMap<i64, Subscription>,
}

/// Process-local store keyed by id.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    inner: RwLock<Inner>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn create(&self, data: NewSubscription) -> StoreResult<i64> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.insert(id, data.with_id(id));
        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Subscription> {
        self.inner
            .read()
            .await
            .records
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, data: &Subscription) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        match inner.records.get_mut(&data.id) {
            Some(slot) => {
                *slot = data.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &ListFilter) -> StoreResult<Vec<Subscription>> {
        let inner = self.inner.read().await;
        let matching = inner
            .records
            .values()
            .rev()
            .filter(|s| filter.matches(&s.user_id, &s.service_name))
            .skip(filter.offset.unwrap_or(0) as usize);

        Ok(match filter.limit {
            Some(limit) => matching.take(limit as usize).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }
}
