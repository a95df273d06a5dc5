use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::{StoreError, StoreResult, SubscriptionStore};
use crate::entities::subscription_entity as subs;
use crate::models::{ListFilter, NewSubscription, Subscription};

pub struct PgSubscriptionStore {
    pool: DatabaseConnection,
}

impl PgSubscriptionStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn create(&self, data: NewSubscription) -> StoreResult<i64> {
        let model = subs::ActiveModel {
            service_name: Set(data.service_name),
            price: Set(data.price),
            user_id: Set(data.user_id),
            start_date: Set(data.start_month.first_day()),
            end_date: Set(data.end_month.map(|m| m.first_day())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        Ok(model.id)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Subscription> {
        subs::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .map(Subscription::from)
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, data: &Subscription) -> StoreResult<()> {
        let res = subs::Entity::update_many()
            .col_expr(
                subs::Column::ServiceName,
                Expr::value(data.service_name.clone()),
            )
            .col_expr(subs::Column::Price, Expr::value(data.price))
            .col_expr(subs::Column::UserId, Expr::value(data.user_id.clone()))
            .col_expr(
                subs::Column::StartDate,
                Expr::value(data.start_month.first_day()),
            )
            .col_expr(
                subs::Column::EndDate,
                Expr::value(data.end_month.map(|m| m.first_day())),
            )
            .col_expr(subs::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(subs::Column::Id.eq(data.id))
            .exec(&self.pool)
            .await?;

        // 影响 0 行视为记录不存在
        if res.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let res = subs::Entity::delete_by_id(id).exec(&self.pool).await?;
        if res.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filter: &ListFilter) -> StoreResult<Vec<Subscription>> {
        let mut query = subs::Entity::find();
        if let Some(user_id) = &filter.user_id {
            query = query.filter(subs::Column::UserId.eq(user_id.clone()));
        }
        if let Some(service_name) = &filter.service_name {
            query = query.filter(subs::Column::ServiceName.eq(service_name.clone()));
        }
        query = query.order_by_desc(subs::Column::Id);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = filter.offset.filter(|o| *o > 0) {
            query = query.offset(offset);
        }

        let models = query.all(&self.pool).await?;
        Ok(models.into_iter().map(Subscription::from).collect())
    }
}
