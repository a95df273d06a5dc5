use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::subscription::{
    CreateSubscriptionResponse, SubscriptionResponse, TotalCostResponse,
};

/// `{"success": true, "data": ...}` or `{"success": false, "error": ...}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    CreateSubscriptionApiResponse = ApiResponse<CreateSubscriptionResponse>,
    SubscriptionApiResponse = ApiResponse<SubscriptionResponse>,
    SubscriptionListApiResponse = ApiResponse<Vec<SubscriptionResponse>>,
    TotalCostApiResponse = ApiResponse<TotalCostResponse>
)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// Error payload, see `AppError::error_response`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}
