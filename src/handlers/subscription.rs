use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::SubscriptionService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, error, web};

fn parse_id(raw: &str) -> AppResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::ValidationError("Invalid subscription id".to_string())),
    }
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(format!("Invalid JSON body: {err}")).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(format!("Invalid query string: {err}")).into()
}

#[utoipa::path(
    post,
    path = "/subscriptions",
    tag = "subscription",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "创建订阅成功", body = CreateSubscriptionApiResponse),
        (status = 400, description = "请求参数错误"),
        (status = 415, description = "Content-Type 必须为 application/json")
    )
)]
pub async fn create_subscription(
    service: web::Data<SubscriptionService>,
    request: web::Json<CreateSubscriptionRequest>,
) -> Result<HttpResponse> {
    let data = match request.into_inner().into_new_subscription() {
        Ok(data) => data,
        Err(e) => return Ok(e.error_response()),
    };

    match service.create(data).await {
        Ok(id) => Ok(HttpResponse::Created()
            .json(ApiResponse::success(CreateSubscriptionResponse { id }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/subscriptions/{id}",
    tag = "subscription",
    params(("id" = i64, Path, description = "订阅 ID")),
    responses(
        (status = 200, description = "获取订阅成功", body = SubscriptionApiResponse),
        (status = 400, description = "ID 不合法"),
        (status = 404, description = "订阅不存在")
    )
)]
pub async fn get_subscription(
    service: web::Data<SubscriptionService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = match parse_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service.get_by_id(id).await {
        Ok(sub) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(SubscriptionResponse::from(sub))))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/subscriptions/{id}",
    tag = "subscription",
    params(("id" = i64, Path, description = "订阅 ID")),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 204, description = "更新成功"),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "订阅不存在"),
        (status = 415, description = "Content-Type 必须为 application/json")
    )
)]
pub async fn update_subscription(
    service: web::Data<SubscriptionService>,
    path: web::Path<String>,
    request: web::Json<UpdateSubscriptionRequest>,
) -> Result<HttpResponse> {
    let parsed = parse_id(&path).and_then(|id| Ok((id, request.into_inner().into_patch()?)));
    let (id, patch) = match parsed {
        Ok(v) => v,
        Err(e) => return Ok(e.error_response()),
    };

    match service.patch(id, patch).await {
        Ok(_) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/subscriptions/{id}",
    tag = "subscription",
    params(("id" = i64, Path, description = "订阅 ID")),
    responses(
        (status = 204, description = "删除成功"),
        (status = 400, description = "ID 不合法"),
        (status = 404, description = "订阅不存在")
    )
)]
pub async fn delete_subscription(
    service: web::Data<SubscriptionService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = match parse_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service.delete(id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/subscriptions",
    tag = "subscription",
    params(ListSubscriptionsQuery),
    responses(
        (status = 200, description = "获取订阅列表成功", body = SubscriptionListApiResponse),
        (status = 400, description = "分页参数错误")
    )
)]
pub async fn list_subscriptions(
    service: web::Data<SubscriptionService>,
    query: web::Query<ListSubscriptionsQuery>,
) -> Result<HttpResponse> {
    let filter = match query.into_inner().into_filter() {
        Ok(filter) => filter,
        Err(e) => return Ok(e.error_response()),
    };

    match service.list(&filter).await {
        Ok(subs) => {
            let items: Vec<SubscriptionResponse> =
                subs.into_iter().map(SubscriptionResponse::from).collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(items)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/subscriptions/total",
    tag = "subscription",
    params(TotalCostQuery),
    responses(
        (status = 200, description = "区间总费用", body = TotalCostApiResponse),
        (status = 400, description = "区间参数错误")
    )
)]
pub async fn total_cost(
    service: web::Data<SubscriptionService>,
    query: web::Query<TotalCostQuery>,
) -> Result<HttpResponse> {
    let (period_start, period_end, filter) = match query.into_inner().into_parts() {
        Ok(parts) => parts,
        Err(e) => return Ok(e.error_response()),
    };

    match service.total_cost(period_start, period_end, filter).await {
        Ok(total_cost) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(TotalCostResponse { total_cost })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/subscriptions")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            // `/total` 必须先于 `/{id}` 注册
            .route("/total", web::get().to(total_cost))
            .route("", web::post().to(create_subscription))
            .route("", web::get().to(list_subscriptions))
            .route("/{id}", web::get().to(get_subscription))
            .route("/{id}", web::patch().to(update_subscription))
            .route("/{id}", web::delete().to(delete_subscription)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middlewares::JsonContentType;
    use crate::store::InMemorySubscriptionStore;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    macro_rules! test_app {
        () => {{
            let service = SubscriptionService::new(Arc::new(InMemorySubscriptionStore::new()));
            test::init_service(
                App::new()
                    .app_data(web::Data::new(service))
                    .wrap(JsonContentType)
                    .service(web::scope("/api/v1").configure(subscription_config)),
            )
            .await
        }};
    }

    fn create_req(body: Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/v1/subscriptions")
            .set_json(body)
    }

    #[actix_web::test]
    async fn test_create_then_get() {
        let app = test_app!();

        let resp = test::call_service(
            &app,
            create_req(json!({
                "service_name": "Yandex Plus",
                "price": 400,
                "user_id": "60601fee-2bf1-4721-ae6f-7636e79a0cba",
                "start_date": "07-2025"
            }))
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let id = body["data"]["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/subscriptions/{id}"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["service_name"], "Yandex Plus");
        assert_eq!(body["data"]["start_date"], "07-2025");
        assert!(body["data"].get("end_date").is_none());
    }

    #[actix_web::test]
    async fn test_create_rejects_bad_input() {
        let app = test_app!();

        let bad_month = create_req(json!({
            "service_name": "S", "price": 1, "user_id": "u", "start_date": "2025-07"
        }));
        let resp = test::call_service(&app, bad_month.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let negative = create_req(json!({
            "service_name": "S", "price": -5, "user_id": "u", "start_date": "07-2025"
        }));
        let resp = test::call_service(&app, negative.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let unknown_field = create_req(json!({
            "service_name": "S", "price": 1, "user_id": "u", "start_date": "07-2025", "x": 1
        }));
        let resp = test::call_service(&app, unknown_field.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_non_json_body_is_415() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/api/v1/subscriptions")
            .insert_header((header::CONTENT_TYPE, "text/plain"))
            .set_payload("service_name=S")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[actix_web::test]
    async fn test_invalid_and_missing_ids() {
        let app = test_app!();

        let req = test::TestRequest::get()
            .uri("/api/v1/subscriptions/0")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::get()
            .uri("/api/v1/subscriptions/abc")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::delete()
            .uri("/api/v1/subscriptions/99")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn test_patch_then_delete() {
        let app = test_app!();
        let resp = test::call_service(
            &app,
            create_req(json!({
                "service_name": "Netflix", "price": 400, "user_id": "u-1",
                "start_date": "01-2025", "end_date": "06-2025"
            }))
            .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(resp).await;
        let id = body["data"]["id"].as_i64().unwrap();
        let uri = format!("/api/v1/subscriptions/{id}");

        let req = test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "price": 550, "end_date": null }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NO_CONTENT
        );

        let req = test::TestRequest::get().uri(&uri).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["price"], 550);
        assert_eq!(body["data"]["service_name"], "Netflix");
        assert!(body["data"].get("end_date").is_none());

        let req = test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::delete().uri(&uri).to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NO_CONTENT
        );
        let req = test::TestRequest::get().uri(&uri).to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn test_list_and_total_cost() {
        let app = test_app!();
        for (user, start, end) in [
            ("u-1", "01-2025", Some("03-2025")),
            ("u-1", "02-2025", Some("04-2025")),
            ("u-2", "12-2024", None),
        ] {
            let mut body = json!({
                "service_name": "Yandex Plus", "price": 400, "user_id": user, "start_date": start
            });
            if let Some(end) = end {
                body["end_date"] = json!(end);
            }
            let resp = test::call_service(&app, create_req(body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/v1/subscriptions?user_id=u-1&limit=1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["start_date"], "02-2025");

        for uri in [
            "/api/v1/subscriptions?limit=500",
            "/api/v1/subscriptions?offset=9223372036854775808",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            assert_eq!(
                test::call_service(&app, req).await.status(),
                StatusCode::BAD_REQUEST,
                "{uri}"
            );
        }

        let req = test::TestRequest::get()
            .uri("/api/v1/subscriptions/total?period_start=01-2025&period_end=03-2025&user_id=u-1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["total_cost"], 2000);

        let req = test::TestRequest::get()
            .uri("/api/v1/subscriptions/total?period_start=01-2025&period_end=03-2025")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["total_cost"], 3200);
    }

    #[actix_web::test]
    async fn test_total_cost_validation() {
        let app = test_app!();

        let req = test::TestRequest::get()
            .uri("/api/v1/subscriptions/total?period_start=03-2025&period_end=01-2025")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::get()
            .uri("/api/v1/subscriptions/total?period_start=03-2025")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }
}
