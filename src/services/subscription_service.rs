use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::aggregation::{self, QueryPeriod};
use crate::store::SubscriptionStore;

#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// 创建订阅，返回新记录 id
    pub async fn create(&self, data: NewSubscription) -> AppResult<i64> {
        validate_terms(data.price, data.start_month, data.end_month)?;

        let id = self
            .store
            .create(data)
            .await
            .map_err(|e| AppError::from_store("create", e))?;
        log::info!("Subscription {id} created");
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Subscription> {
        self.store
            .get_by_id(id)
            .await
            .map_err(|e| AppError::from_store("get_by_id", e))
    }

    /// Full replace; the record must already exist.
    pub async fn update(&self, data: Subscription) -> AppResult<()> {
        validate_terms(data.price, data.start_month, data.end_month)?;

        self.store
            .update(&data)
            .await
            .map_err(|e| AppError::from_store("update", e))?;
        log::info!("Subscription {} updated", data.id);
        Ok(())
    }

    /// 部分更新：读出现有记录，合并提供的字段后整体写回
    pub async fn patch(&self, id: i64, patch: SubscriptionPatch) -> AppResult<Subscription> {
        let mut current = self.get_by_id(id).await?;
        patch.apply(&mut current);
        self.update(current.clone()).await?;
        Ok(current)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.store
            .delete(id)
            .await
            .map_err(|e| AppError::from_store("delete", e))?;
        log::info!("Subscription {id} deleted");
        Ok(())
    }

    pub async fn list(&self, filter: &ListFilter) -> AppResult<Vec<Subscription>> {
        self.store
            .list(filter)
            .await
            .map_err(|e| AppError::from_store("list", e))
    }

    /// Total cost of the matching subscriptions over `[period_start, period_end]`.
    ///
    /// The period is validated before the store is touched, and pagination in
    /// `filter` is ignored so every matching record is counted.
    pub async fn total_cost(
        &self,
        period_start: CalendarMonth,
        period_end: CalendarMonth,
        filter: ListFilter,
    ) -> AppResult<i64> {
        let period = QueryPeriod::new(period_start, period_end)?;

        let subs = self
            .store
            .list(&filter.unbounded())
            .await
            .map_err(|e| AppError::from_store("total_cost", e))?;

        let total = aggregation::total_cost(&period, &subs)?;
        log::debug!(
            "Total cost {period_start}..{period_end} ({} months): {total} over {} subscriptions",
            period.month_count(),
            subs.len()
        );
        Ok(total)
    }
}
