use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{AppError, AppResult};

pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 100;

/// Filter shared by the HTTP layer, the service and the store.
///
/// `None` means "do not filter on this field". Pagination is ignored when
/// both `limit` and `offset` are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub user_id: Option<String>,
    pub service_name: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ListFilter {
    pub fn by_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Same filter without limit/offset, so the caller sees every match.
    pub fn unbounded(self) -> Self {
        Self {
            limit: None,
            offset: None,
            ..self
        }
    }

    pub fn matches(&self, user_id: &str, service_name: &str) -> bool {
        self.user_id.as_deref().is_none_or(|u| u == user_id)
            && self.service_name.as_deref().is_none_or(|s| s == service_name)
    }
}

/// 空白字符串视为未提供
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSubscriptionsQuery {
    /// 按用户过滤
    pub user_id: Option<String>,
    /// 按服务名过滤（精确匹配）
    pub service_name: Option<String>,
    /// 每页数量，1..=100，默认 50
    pub limit: Option<String>,
    /// 偏移量，>= 0，默认 0
    pub offset: Option<String>,
}

impl ListSubscriptionsQuery {
    pub fn into_filter(self) -> AppResult<ListFilter> {
        let limit = match non_blank(self.limit) {
            Some(raw) => match raw.parse::<i64>().map(u64::try_from) {
                Ok(Ok(n)) if (1..=MAX_LIST_LIMIT).contains(&n) => n,
                _ => {
                    return Err(AppError::ValidationError(format!(
                        "limit must be a number between 1 and {MAX_LIST_LIMIT}"
                    )));
                }
            },
            None => DEFAULT_LIST_LIMIT,
        };

        // 数据库以有符号 64 位绑定分页参数
        let offset = match non_blank(self.offset) {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| {
                    AppError::ValidationError(format!(
                        "offset must be a number between 0 and {}",
                        i64::MAX
                    ))
                })?,
            None => 0,
        };

        Ok(ListFilter {
            user_id: non_blank(self.user_id),
            service_name: non_blank(self.service_name),
            limit: Some(limit),
            offset: Some(offset),
        })
    }
}
