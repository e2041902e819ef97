//! HTTP routes for authentication
//!
//! - POST /auth/signup - create an account and get a token
//! - POST /auth/signin - exchange handle and password for a token
//! - GET  /auth/me     - current account from the bearer token

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};

use crate::auth::authenticate;
use crate::routes::response::{
    authorization_header, error_response, parse_json_body, respond, BoxBody,
};
use crate::server::AppState;
use crate::services::{SignInRequest, SignUpRequest};
use crate::types::{KicklistError, NotFoundError};

/// Dispatch a request under /auth
pub async fn handle_auth_request<B>(req: Request<B>, state: &AppState) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let limit = state.args.max_body_bytes;

    match (method, path.as_str()) {
        (Method::POST, "/auth/signup") => {
            let result = match parse_json_body::<_, SignUpRequest>(req.into_body(), limit).await {
                Ok(body) => state.accounts.register(body).await,
                Err(e) => Err(e),
            };
            respond(StatusCode::CREATED, result)
        }

        (Method::POST, "/auth/signin") => {
            let result = match parse_json_body::<_, SignInRequest>(req.into_body(), limit).await {
                Ok(body) => state.accounts.sign_in(body).await,
                Err(e) => Err(e),
            };
            respond(StatusCode::OK, result)
        }

        (Method::GET, "/auth/me") => {
            let caller =
                authorization_header(&req).and_then(|h| authenticate(h, state.jwt()));
            let result = match caller {
                Ok(caller) => state.accounts.me(&caller).await,
                Err(e) => Err(e.into()),
            };
            respond(StatusCode::OK, result)
        }

        (_, "/auth/signup") | (_, "/auth/signin") | (_, "/auth/me") => {
            error_response(KicklistError::MethodNotAllowed)
        }

        _ => error_response(NotFoundError::Route(path.clone()).into()),
    }
}
