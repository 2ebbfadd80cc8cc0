use crate::tracing::RequestId;
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Header name for the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

fn inbound_request_id(request: &Request) -> Option<(RequestId, HeaderValue)> {
    let raw = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    let value = HeaderValue::from_str(trimmed).ok()?;
    Some((RequestId::new(trimmed), value))
}

/// Echoes a caller-supplied `x-request-id` or mints one, exposing it as an
/// extension, a task-local and a response header.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let (request_id, header_value) = match inbound_request_id(&request) {
        Some(found) => found,
        None => {
            let generated = RequestId::default();
            // uuid text is always a valid header value
            let value = HeaderValue::from_str(generated.as_str())
                .unwrap_or_else(|_| HeaderValue::from_static("invalid"));
            (generated, value)
        }
    };

    request.headers_mut().insert(
        HeaderName::from_static(REQUEST_ID_HEADER),
        header_value.clone(),
    );
    request.extensions_mut().insert(request_id.clone());

    let mut response =
        crate::tracing::scope_request_id(request_id, async move { next.run(request).await })
            .await;

    response
        .headers_mut()
        .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);

    response
}
