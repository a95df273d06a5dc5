pub mod aggregation;
pub mod subscription_service;

pub use aggregation::QueryPeriod;
pub use subscription_service::*;
