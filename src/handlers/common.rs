use crate::errors::{ApiError, ServiceError};
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

/// Header carrying the anonymous visitor's cart token.
pub const SESSION_HEADER: &str = "x-session-id";

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// JSON body extractor whose rejections (bad syntax, missing or mistyped
/// fields, wrong content type) surface as 400 in the shared error body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Session token from `x-session-id`, if present and non-blank.
pub fn session_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_header_is_trimmed_and_bounded() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id_from(&headers), None);

        headers.insert(SESSION_HEADER, HeaderValue::from_static("  abc  "));
        assert_eq!(session_id_from(&headers).as_deref(), Some("abc"));

        headers.insert(SESSION_HEADER, HeaderValue::from_static("   "));
        assert_eq!(session_id_from(&headers), None);

        let long = "x".repeat(129);
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&long).unwrap());
        assert_eq!(session_id_from(&headers), None);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        #[derive(serde::Deserialize)]
        struct Probe {
            #[allow(dead_code)]
            quantity: i32,
        }
        let request = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"qty": 1}"#))
            .unwrap();
        let err = JsonBody::<Probe>::from_request(request, &())
            .await
            .err()
            .expect("missing field is rejected");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_failures_are_bad_requests() {
        #[derive(Validate)]
        struct Probe {
            #[validate(range(min = 1))]
            quantity: i32,
        }
        let err = validate_input(&Probe { quantity: 0 }).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
