use crate::error::AppError;
use actix_web::body::EitherBody;
use actix_web::http::{Method, header};
use actix_web::{
    Error, ResponseError,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// `application/json` with or without parameters such as `charset`.
pub fn is_json_content_type(value: &str) -> bool {
    let ct = value.trim().to_ascii_lowercase();
    ct == "application/json" || ct.starts_with("application/json;")
}

fn carries_body(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::PATCH
}

/// Rejects POST/PUT/PATCH requests whose body is not declared as JSON with 415.
pub struct JsonContentType;

impl<S, B> Transform<S, ServiceRequest> for JsonContentType
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JsonContentTypeService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JsonContentTypeService { service }))
    }
}

pub struct JsonContentTypeService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for JsonContentTypeService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if carries_body(req.method()) {
            let content_type = req
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();

            if !is_json_content_type(&content_type) {
                log::warn!(
                    "Rejected {} {} with Content-Type {:?}",
                    req.method(),
                    req.path(),
                    content_type
                );
                let error = AppError::UnsupportedMediaType(
                    "Expected Content-Type: application/json".to_string(),
                );
                let res = req
                    .into_response(error.error_response())
                    .map_into_right_body();
                return Box::pin(async move { Ok(res) });
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
