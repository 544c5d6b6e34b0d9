//! HTTP Middleware
//!
//! 请求结果日志：4xx/5xx 带上调用方身份与耗时

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::USER_ID_HEADER;

/// 请求头里的调用方 id，缺失时记为 "-"
fn caller_of(request: &Request) -> String {
    request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// 错误响应日志中间件
///
/// ApiError::into_response() 已记录具体错误，这里只补充请求维度的信息。
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let caller = caller_of(&request);
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            caller = %caller,
            status = status.as_u16(),
            elapsed_ms,
            "Request failed"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            caller = %caller,
            status = status.as_u16(),
            elapsed_ms,
            "Request rejected"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::post,
        Router,
    };
    use tower::util::ServiceExt;

    fn create_test_router() -> Router {
        Router::new()
            .route("/chapter/move", post(|| async { StatusCode::OK }))
            .route("/chapter/delete", post(|| async { StatusCode::FORBIDDEN }))
            .route(
                "/chapter/create",
                post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            )
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn call(uri: &str, caller: Option<&str>) -> StatusCode {
        let mut builder = HttpRequest::builder().method("POST").uri(uri);
        if let Some(caller) = caller {
            builder = builder.header(USER_ID_HEADER, caller);
        }
        let request = builder.body(Body::empty()).unwrap();
        create_test_router().oneshot(request).await.unwrap().status()
    }

    #[test]
    fn test_caller_of_reads_header() {
        let request = HttpRequest::builder()
            .header(USER_ID_HEADER, "42")
            .body(Body::empty())
            .unwrap();
        assert_eq!(caller_of(&request), "42");

        let anonymous = HttpRequest::builder().body(Body::empty()).unwrap();
        assert_eq!(caller_of(&anonymous), "-");
    }

    #[tokio::test]
    async fn test_status_passes_through() {
        assert_eq!(call("/chapter/move", Some("42")).await, StatusCode::OK);
        assert_eq!(call("/chapter/delete", None).await, StatusCode::FORBIDDEN);
        assert_eq!(
            call("/chapter/create", Some("42")).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
