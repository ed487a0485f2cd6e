//! Permissive CORS headers applied to every response

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, StatusCode, response::Builder},
    middleware::Next,
    response::Response,
};

pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET,POST,OPTIONS"),
    (
        "access-control-allow-headers",
        "content-type, x-reasoning-effort, x-gptoss-thread-id, x-gptoss-user-id, x-show-reasoning, authorization",
    ),
    (
        "access-control-expose-headers",
        "x-gptoss-user-id, x-gptoss-thread-id",
    ),
];

/// Add the CORS header set to a response builder
pub fn with_cors(mut builder: Builder) -> Builder {
    for (name, value) in CORS_HEADERS {
        builder = builder.header(*name, *value);
    }
    builder
}

fn apply(headers: &mut HeaderMap) {
    for (name, value) in CORS_HEADERS {
        headers.insert(*name, HeaderValue::from_static(*value));
    }
}

/// Middleware: answer any `OPTIONS` request directly and stamp the CORS
/// headers on everything else.
pub async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::OK;
        apply(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply(response.headers_mut());
    response
}
