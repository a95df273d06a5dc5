//! 费用汇总：按自然月计算订阅与查询区间的重叠月数并乘以月价。
//!
//! Everything here is pure. Months are whole units: both ends of the overlap
//! are inclusive, so a subscription that starts and ends in the queried month
//! counts once.

use crate::error::{AppError, AppResult};
use crate::models::{CalendarMonth, Subscription};

/// Inclusive `[start, end]` range of calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPeriod {
    start: CalendarMonth,
    end: CalendarMonth,
}

impl QueryPeriod {
    pub fn new(start: CalendarMonth, end: CalendarMonth) -> AppResult<Self> {
        if end < start {
            return Err(AppError::ValidationError(
                "period_end must not be earlier than period_start".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> CalendarMonth {
        self.start
    }

    pub fn end(&self) -> CalendarMonth {
        self.end
    }

    pub fn month_count(&self) -> i64 {
        self.start.months_until(self.end) + 1
    }
}

/// Months during which `sub` is active inside `period`, `0` if disjoint.
pub fn overlap_months(sub: &Subscription, period: &QueryPeriod) -> i64 {
    let start = sub.start_month.max(period.start);
    let end = match sub.end_month {
        Some(end_month) => end_month.min(period.end),
        None => period.end,
    };
    if end < start {
        return 0;
    }
    start.months_until(end) + 1
}

/// Sum of `overlap_months * price` over `subs`.
///
/// Fails with a validation error when the sum does not fit in `i64`.
pub fn total_cost<'a, I>(period: &QueryPeriod, subs: I) -> AppResult<i64>
where
    I: IntoIterator<Item = &'a Subscription>,
{
    subs.into_iter().try_fold(0i64, |acc, sub| {
        let months = overlap_months(sub, period);
        if months <= 0 {
            return Ok(acc);
        }
        months
            .checked_mul(i64::from(sub.price))
            .and_then(|cost| acc.checked_add(cost))
            .ok_or_else(|| {
                AppError::ValidationError(
                    "total cost is out of range, narrow the period or the filter".to_string(),
                )
            })
    })
}
