use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::subscription::create_subscription,
        handlers::subscription::get_subscription,
        handlers::subscription::update_subscription,
        handlers::subscription::delete_subscription,
        handlers::subscription::list_subscriptions,
        handlers::subscription::total_cost,
    ),
    components(
        schemas(
            CreateSubscriptionRequest,
            CreateSubscriptionResponse,
            UpdateSubscriptionRequest,
            SubscriptionResponse,
            TotalCostResponse,
            ApiError,
            CreateSubscriptionApiResponse,
            SubscriptionApiResponse,
            SubscriptionListApiResponse,
            TotalCostApiResponse,
        )
    ),
    tags(
        (name = "subscription", description = "Subscription records and cost aggregation API"),
    ),
    info(
        title = "Subscription Aggregator API",
        version = "1.0.0",
        description = "REST API for user subscription records and their total cost over a month range"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
