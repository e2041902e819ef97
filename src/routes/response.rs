//! Response and request-body helpers shared by every route
//!
//! All error bodies have the shape `{ "error": "<message>" }`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{self, HeaderValue};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::types::{AuthError, KicklistError, ValidationError};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    full_body(Bytes::new())
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = match serde_json::to_vec(body) {
        Ok(json) => json,
        Err(e) => {
            error!("Response serialization failed: {}", e);
            return error_response(KicklistError::Internal(e.to_string()));
        }
    };

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Map an error onto its status and client-safe body. Internal detail is
/// logged here and nowhere else.
pub fn error_response(err: KicklistError) -> Response<BoxBody> {
    if err.is_internal() {
        error!("Request failed: {}", err);
    }
    let (status, message) = err.into_status_code_and_body();
    json_response(status, &ErrorResponse { error: message })
}

/// Turn a handler result into a response
pub fn respond<T: Serialize>(
    status: StatusCode,
    result: Result<T, KicklistError>,
) -> Response<BoxBody> {
    match result {
        Ok(body) => json_response(status, &body),
        Err(err) => error_response(err),
    }
}

/// Raw `Authorization` header value
///
/// A header that is present but not visible ASCII is malformed, not missing.
pub fn authorization_header<B>(req: &Request<B>) -> Result<Option<&str>, AuthError> {
    req.headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| AuthError::MalformedHeader))
        .transpose()
}

/// Empty 204 for CORS preflight
pub fn preflight_response() -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    response
}

/// Attach CORS headers when the request origin is allowed
pub fn apply_cors(
    response: &mut Response<BoxBody>,
    origin: Option<&HeaderValue>,
    allowed: &[String],
) {
    let allow_origin = if allowed.iter().any(|o| o == "*") {
        HeaderValue::from_static("*")
    } else {
        match origin {
            Some(origin) if allowed.iter().any(|o| origin.as_bytes() == o.as_bytes()) => {
                response
                    .headers_mut()
                    .insert(header::VARY, HeaderValue::from_static("Origin"));
                origin.clone()
            }
            _ => return,
        }
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, PATCH, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

/// Read and decode a JSON body of at most `limit` bytes. An empty body
/// decodes as `{}` so the per-field checks report what is missing.
pub async fn parse_json_body<B, T>(body: B, limit: usize) -> Result<T, KicklistError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: DeserializeOwned,
{
    let bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                ValidationError::InvalidBody(format!("body exceeds {} bytes", limit))
            } else {
                ValidationError::InvalidBody(format!("failed to read body: {}", e))
            }
        })?
        .to_bytes();

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default)]
        name: Option<String>,
    }

    async fn body_string(response: Response<BoxBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_shape() {
        let response = error_response(KicklistError::Database("socket closed".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, r#"{"error":"Internal server error"}"#);
    }

    #[test]
    fn test_authorization_header_presence() {
        let req = Request::new(());
        assert_eq!(authorization_header(&req), Ok(None));

        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc")
            .body(())
            .unwrap();
        assert_eq!(authorization_header(&req), Ok(Some("Bearer abc")));

        let req = Request::builder()
            .header(
                header::AUTHORIZATION,
                HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
            )
            .body(())
            .unwrap();
        assert_eq!(authorization_header(&req), Err(AuthError::MalformedHeader));
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_empty_object() {
        let payload: Payload = parse_json_body(Full::new(Bytes::new()), 1024).await.unwrap();
        assert!(payload.name.is_none());
    }

    #[tokio::test]
    async fn test_oversize_and_invalid_bodies_rejected() {
        let big = Full::new(Bytes::from(vec![b' '; 2048]));
        let err = parse_json_body::<_, Payload>(big, 1024).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let bad = Full::new(Bytes::from_static(b"{not json"));
        let err = parse_json_body::<_, Payload>(bad, 1024).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cors_only_for_allowed_origins() {
        let allowed = vec!["https://app.example".to_string()];

        let mut response = json_response(StatusCode::OK, &"ok");
        apply_cors(
            &mut response,
            Some(&HeaderValue::from_static("https://app.example")),
            &allowed,
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example"
        );

        let mut response = json_response(StatusCode::OK, &"ok");
        apply_cors(
            &mut response,
            Some(&HeaderValue::from_static("https://evil.example")),
            &allowed,
        );
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
