//! HTTP routes for kicks and their comments
//!
//! Every path under /kicks is authenticated before it is matched:
//!
//! - GET    /kicks
//! - POST   /kicks
//! - GET    /kicks/:id
//! - PUT    /kicks/:id
//! - DELETE /kicks/:id
//! - PATCH  /kicks/:id/status
//! - POST   /kicks/:id/comments
//! - PUT    /kicks/:id/comments/:cid
//! - DELETE /kicks/:id/comments/:cid

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::auth::authenticate;
use crate::routes::response::{
    authorization_header, error_response, parse_json_body, respond, BoxBody,
};
use crate::server::AppState;
use crate::services::{CommentRequest, KickRequest, StatusRequest};
use crate::types::{KicklistError, NotFoundError};

/// Dispatch a request under /kicks
pub async fn handle_kick_request<B>(req: Request<B>, state: &AppState) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let caller = match authorization_header(&req).and_then(|h| authenticate(h, state.jwt())) {
        Ok(caller) => caller,
        Err(e) => return error_response(e.into()),
    };

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path
        .trim_start_matches("/kicks")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let kicks = &state.kicks;
    let limit = state.args.max_body_bytes;

    match (method, segments.as_slice()) {
        (Method::GET, []) => respond(StatusCode::OK, kicks.list(&caller).await),
        (Method::POST, []) => {
            let result = with_body(req, limit, |body: KickRequest| kicks.create(&caller, body)).await;
            respond(StatusCode::CREATED, result)
        }

        (Method::GET, [id]) => respond(StatusCode::OK, kicks.get(&caller, id).await),
        (Method::PUT, [id]) => {
            let result = with_body(req, limit, |body| kicks.update(&caller, id, body)).await;
            respond(StatusCode::OK, result)
        }
        (Method::DELETE, [id]) => respond(StatusCode::OK, kicks.delete(&caller, id).await),

        (Method::PATCH, [id, "status"]) => {
            let result = with_body(req, limit, |body: StatusRequest| {
                kicks.update_status(&caller, id, body)
            })
            .await;
            respond(StatusCode::OK, result)
        }

        (Method::POST, [id, "comments"]) => {
            let result = with_body(req, limit, |body: CommentRequest| {
                kicks.add_comment(&caller, id, body)
            })
            .await;
            respond(StatusCode::CREATED, result)
        }

        (Method::PUT, [id, "comments", cid]) => {
            let result = with_body(req, limit, |body: CommentRequest| {
                kicks.update_comment(&caller, id, cid, body)
            })
            .await;
            respond(StatusCode::OK, result)
        }
        (Method::DELETE, [id, "comments", cid]) => {
            respond(StatusCode::OK, kicks.delete_comment(&caller, id, cid).await)
        }

        (_, []) | (_, [_]) | (_, [_, "status"]) | (_, [_, "comments"]) | (_, [_, "comments", _]) => {
            error_response(KicklistError::MethodNotAllowed)
        }

        _ => error_response(NotFoundError::Route(path.clone()).into()),
    }
}

/// Decode the body and hand it to the service call
async fn with_body<B, T, F, Fut, R>(
    req: Request<B>,
    limit: usize,
    call: F,
) -> Result<R, KicklistError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: DeserializeOwned,
    F: FnOnce(T) -> Fut,
    Fut: std::future::Future<Output = Result<R, KicklistError>>,
{
    let body = parse_json_body(req.into_body(), limit).await?;
    call(body).await
}
