use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};
use crate::models::filter::{ListFilter, non_blank};
use crate::models::month::CalendarMonth;

/// A stored subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: i64,
    pub service_name: String,
    /// Monthly price in minor currency units.
    pub price: i32,
    pub user_id: String,
    pub start_month: CalendarMonth,
    /// `None` means open-ended.
    pub end_month: Option<CalendarMonth>,
}

/// A subscription that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    pub start_month: CalendarMonth,
    pub end_month: Option<CalendarMonth>,
}

impl NewSubscription {
    pub fn with_id(self, id: i64) -> Subscription {
        Subscription {
            id,
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
            start_month: self.start_month,
            end_month: self.end_month,
        }
    }
}

/// Checks the two record invariants shared by create and update.
pub fn validate_terms(
    price: i32,
    start_month: CalendarMonth,
    end_month: Option<CalendarMonth>,
) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::ValidationError(
            "price must not be negative".to_string(),
        ));
    }
    if end_month.is_some_and(|end| end < start_month) {
        return Err(AppError::ValidationError(
            "end_date must not be earlier than start_date".to_string(),
        ));
    }
    Ok(())
}

/// Merge-patch: only `Some` fields are applied.
///
/// `end_month` is doubly optional: `None` leaves the end month alone,
/// `Some(None)` clears it and `Some(Some(m))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPatch {
    pub service_name: Option<String>,
    pub price: Option<i32>,
    pub user_id: Option<String>,
    pub start_month: Option<CalendarMonth>,
    pub end_month: Option<Option<CalendarMonth>>,
}

impl SubscriptionPatch {
    pub fn is_empty(&self) -> bool {
        self.service_name.is_none()
            && self.price.is_none()
            && self.user_id.is_none()
            && self.start_month.is_none()
            && self.end_month.is_none()
    }

    pub fn apply(self, target: &mut Subscription) {
        if let Some(service_name) = self.service_name {
            target.service_name = service_name;
        }
        if let Some(price) = self.price {
            target.price = price;
        }
        if let Some(user_id) = self.user_id {
            target.user_id = user_id;
        }
        if let Some(start_month) = self.start_month {
            target.start_month = start_month;
        }
        if let Some(end_month) = self.end_month {
            target.end_month = end_month;
        }
    }
}

fn parse_month(field: &str, raw: &str) -> AppResult<CalendarMonth> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::ValidationError(format!("{field} must be in MM-YYYY format")))
}

fn required_text(field: &str, value: String) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateSubscriptionRequest {
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    /// 每月价格（最小货币单位）
    #[schema(example = 400)]
    pub price: i32,
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,
    #[schema(example = "07-2025")]
    pub start_date: String,
    /// 为空表示无结束月份
    #[serde(default)]
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
}

impl CreateSubscriptionRequest {
    pub fn into_new_subscription(self) -> AppResult<NewSubscription> {
        let service_name = required_text("service_name", self.service_name)?;
        let user_id = required_text("user_id", self.user_id)?;
        let start_month = parse_month("start_date", &self.start_date)?;
        let end_month = match non_blank(self.end_date) {
            Some(raw) => Some(parse_month("end_date", &raw)?),
            None => None,
        };

        Ok(NewSubscription {
            service_name,
            price: self.price,
            user_id,
            start_month,
            end_month,
        })
    }
}

/// Absent stays `None`; `null` or a blank string becomes `Some(None)`.
fn deserialize_clearable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(Some(non_blank(value)))
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateSubscriptionRequest {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub price: Option<i32>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    #[schema(example = "08-2025")]
    pub start_date: Option<String>,
    /// `null` 或空字符串表示清除结束月份
    #[serde(default, deserialize_with = "deserialize_clearable")]
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<Option<String>>,
}

impl UpdateSubscriptionRequest {
    pub fn into_patch(self) -> AppResult<SubscriptionPatch> {
        let service_name = self
            .service_name
            .map(|v| {
                non_blank(Some(v)).ok_or_else(|| {
                    AppError::ValidationError("service_name must not be empty".to_string())
                })
            })
            .transpose()?;
        let user_id = self
            .user_id
            .map(|v| {
                non_blank(Some(v)).ok_or_else(|| {
                    AppError::ValidationError("user_id must not be empty".to_string())
                })
            })
            .transpose()?;
        let start_month = self
            .start_date
            .map(|raw| parse_month("start_date", &raw))
            .transpose()?;
        let end_month = match self.end_date {
            Some(Some(raw)) => Some(Some(parse_month("end_date", &raw)?)),
            Some(None) => Some(None),
            None => None,
        };

        let patch = SubscriptionPatch {
            service_name,
            price: self.price,
            user_id,
            start_month,
            end_month,
        };
        if patch.is_empty() {
            return Err(AppError::ValidationError(
                "at least one field must be provided for update".to_string(),
            ));
        }
        Ok(patch)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    #[schema(example = "07-2025")]
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            service_name: s.service_name,
            price: s.price,
            user_id: s.user_id,
            start_date: s.start_month.to_string(),
            end_date: s.end_month.map(|m| m.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionResponse {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TotalCostQuery {
    /// 统计起始月份 MM-YYYY
    pub period_start: Option<String>,
    /// 统计结束月份 MM-YYYY（含）
    pub period_end: Option<String>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

impl TotalCostQuery {
    pub fn into_parts(self) -> AppResult<(CalendarMonth, CalendarMonth, ListFilter)> {
        let (Some(start), Some(end)) = (non_blank(self.period_start), non_blank(self.period_end))
        else {
            return Err(AppError::ValidationError(
                "period_start and period_end are required".to_string(),
            ));
        };
        let period_start = parse_month("period_start", &start)?;
        let period_end = parse_month("period_end", &end)?;

        let filter = ListFilter {
            user_id: non_blank(self.user_id),
            service_name: non_blank(self.service_name),
            ..Default::default()
        };
        Ok((period_start, period_end, filter))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalCostResponse {
    #[schema(example = 1200)]
    pub total_cost: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> CalendarMonth {
        CalendarMonth::new(year, month).unwrap()
    }

    fn sample() -> Subscription {
        Subscription {
            id: 7,
            service_name: "Yandex Plus".to_string(),
            price: 400,
            user_id: "u-1".to_string(),
            start_month: ym(2025, 7),
            end_month: Some(ym(2025, 12)),
        }
    }

    #[test]
    fn test_validate_terms() {
        assert!(validate_terms(0, ym(2025, 1), None).is_ok());
        assert!(validate_terms(400, ym(2025, 1), Some(ym(2025, 1))).is_ok());
        assert!(matches!(
            validate_terms(-1, ym(2025, 1), None),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            validate_terms(400, ym(2025, 2), Some(ym(2025, 1))),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_create_request_parses_months() {
        let req: CreateSubscriptionRequest = serde_json::from_str(
            r#"{"service_name":" Yandex Plus ","price":400,"user_id":"u-1","start_date":"07-2025"}"#,
        )
        .unwrap();
        let new = req.into_new_subscription().unwrap();
        assert_eq!(new.service_name, "Yandex Plus");
        assert_eq!(new.start_month, ym(2025, 7));
        assert_eq!(new.end_month, None);
    }

    #[test]
    fn test_create_request_blank_end_date_is_open_ended() {
        let req: CreateSubscriptionRequest = serde_json::from_str(
            r#"{"service_name":"S","price":1,"user_id":"u","start_date":"01-2025","end_date":"  "}"#,
        )
        .unwrap();
        assert_eq!(req.into_new_subscription().unwrap().end_month, None);
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreateSubscriptionRequest {
            service_name: "   ".to_string(),
            price: 1,
            user_id: "u".to_string(),
            start_date: "01-2025".to_string(),
            end_date: None,
        };
        assert!(matches!(
            req.into_new_subscription(),
            Err(AppError::ValidationError(msg)) if msg.contains("service_name")
        ));

        let req = CreateSubscriptionRequest {
            service_name: "S".to_string(),
            price: 1,
            user_id: "u".to_string(),
            start_date: "2025-01".to_string(),
            end_date: None,
        };
        assert!(matches!(
            req.into_new_subscription(),
            Err(AppError::ValidationError(msg)) if msg.contains("start_date")
        ));
    }

    #[test]
    fn test_create_request_rejects_unknown_fields() {
        let res = serde_json::from_str::<CreateSubscriptionRequest>(
            r#"{"service_name":"S","price":1,"user_id":"u","start_date":"01-2025","extra":true}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_update_request_distinguishes_absent_and_cleared_end_date() {
        let absent: UpdateSubscriptionRequest = serde_json::from_str(r#"{"price":500}"#).unwrap();
        assert_eq!(absent.end_date, None);

        let null: UpdateSubscriptionRequest = serde_json::from_str(r#"{"end_date":null}"#).unwrap();
        assert_eq!(null.end_date, Some(None));

        let blank: UpdateSubscriptionRequest = serde_json::from_str(r#"{"end_date":""}"#).unwrap();
        assert_eq!(blank.into_patch().unwrap().end_month, Some(None));

        let set: UpdateSubscriptionRequest =
            serde_json::from_str(r#"{"end_date":"03-2026"}"#).unwrap();
        assert_eq!(set.into_patch().unwrap().end_month, Some(Some(ym(2026, 3))));
    }

    #[test]
    fn test_update_request_requires_a_field() {
        let req: UpdateSubscriptionRequest = serde_json::from_str("{}").unwrap();
        assert!(matches!(req.into_patch(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_update_request_rejects_empty_text() {
        let req: UpdateSubscriptionRequest =
            serde_json::from_str(r#"{"user_id":"  "}"#).unwrap();
        assert!(matches!(
            req.into_patch(),
            Err(AppError::ValidationError(msg)) if msg.contains("user_id")
        ));
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let mut sub = sample();
        SubscriptionPatch {
            price: Some(999),
            ..Default::default()
        }
        .apply(&mut sub);
        assert_eq!(sub.price, 999);
        assert_eq!(sub.service_name, "Yandex Plus");
        assert_eq!(sub.end_month, Some(ym(2025, 12)));

        SubscriptionPatch {
            end_month: Some(None),
            ..Default::default()
        }
        .apply(&mut sub);
        assert_eq!(sub.end_month, None);
        assert_eq!(sub.start_month, ym(2025, 7));
    }

    #[test]
    fn test_response_formats_months() {
        let resp = SubscriptionResponse::from(sample());
        assert_eq!(resp.start_date, "07-2025");
        assert_eq!(resp.end_date.as_deref(), Some("12-2025"));

        let mut open = sample();
        open.end_month = None;
        let json = serde_json::to_value(SubscriptionResponse::from(open)).unwrap();
        assert!(json.get("end_date").is_none());
    }

    #[test]
    fn test_total_cost_query() {
        let query = TotalCostQuery {
            period_start: Some("01-2025".to_string()),
            period_end: Some(" 03-2025 ".to_string()),
            user_id: Some("u-1".to_string()),
            service_name: Some("".to_string()),
        };
        let (start, end, filter) = query.into_parts().unwrap();
        assert_eq!(start, ym(2025, 1));
        assert_eq!(end, ym(2025, 3));
        assert_eq!(filter, ListFilter::by_user("u-1"));

        let missing = TotalCostQuery {
            period_start: Some("01-2025".to_string()),
            ..Default::default()
        };
        assert!(matches!(missing.into_parts(), Err(AppError::ValidationError(_))));
    }
}
