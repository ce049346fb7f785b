/*!
 * 固定窗口速率限制
 *
 * 已认证请求按用户计数，否则按客户端 IP。超过限制返回 429。
 *
 * ```rust,ignore
 * web::resource("/{id}/submit")
 *     .wrap(RateLimit::submission())
 *     .route(web::post().to(submit))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};

/// 键: 前缀:标识，值: 窗口内请求数
static RATE_LIMIT_CACHE: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(60))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
            key_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    /// 作业提交：10 次/分钟/用户
    pub fn submission() -> Self {
        Self::new(10, 60).with_prefix("submit")
    }

    /// 手动触发批量评分：5 次/分钟/用户
    pub fn batch_grading() -> Self {
        Self::new(5, 60).with_prefix("batch_grade")
    }

    fn cache_key(&self, identifier: &str) -> String {
        if self.key_prefix.is_empty() {
            identifier.to_string()
        } else {
            format!("{}:{}", self.key_prefix, identifier)
        }
    }
}

/// 优先取连接地址，其次是代理转发头
fn client_ip(req: &ServiceRequest) -> String {
    let is_ip = |s: &str| s.parse::<IpAddr>().is_ok();

    if let Some(ip) = req.connection_info().realip_remote_addr()
        && is_ip(ip)
    {
        return ip.to_string();
    }

    if let Some(value) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        && let Some(ip) = value.split(',').next().map(str::trim)
        && is_ip(ip)
    {
        return ip.to_string();
    }

    "unknown".to_string()
}

fn identifier(req: &ServiceRequest) -> String {
    match req.extensions().get::<User>() {
        Some(user) => format!("user:{}", user.id),
        None => format!("ip:{}", client_ip(req)),
    }
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let key = limit.cache_key(&identifier(&req));
            let count = RATE_LIMIT_CACHE.get(&key).await.unwrap_or(0);

            if count >= limit.max_requests {
                warn!("Rate limit exceeded for {} ({}/{})", key, count, limit.max_requests);
                return Ok(req.into_response(
                    too_many_requests(limit.window_secs).map_into_right_body(),
                ));
            }

            RATE_LIMIT_CACHE.insert(key, count + 1).await;
            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_and_keys() {
        let submit = RateLimit::submission();
        assert_eq!(submit.max_requests, 10);
        assert_eq!(submit.window_secs, 60);
        assert_eq!(submit.cache_key("user:7"), "submit:user:7");

        assert_eq!(RateLimit::batch_grading().max_requests, 5);
        assert_eq!(RateLimit::new(1, 1).cache_key("ip:::1"), "ip:::1");
    }
}
