//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per connection. Routing is a plain
//! match on method and path prefix.

use bytes::Bytes;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::{AccountStore, KickStore, MemoryAccountStore, MemoryKickStore};
use crate::routes::{self, BoxBody};
use crate::services::{AccountService, KickPolicy, KickService};
use crate::types::{KicklistError, NotFoundError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub accounts: AccountService,
    pub kicks: KickService,
    allowed_origins: Vec<String>,
}

impl AppState {
    /// Wire services over the given stores
    pub fn new(
        args: Args,
        accounts: Arc<dyn AccountStore>,
        kicks: Arc<dyn KickStore>,
    ) -> Result<Self> {
        let jwt = args.jwt_validator()?;
        let policy = KickPolicy {
            require_description: args.require_description,
            read_scope: args.kick_read_scope,
        };

        Ok(Self {
            allowed_origins: args.allowed_origin_list(),
            accounts: AccountService::new(Arc::clone(&accounts), jwt),
            kicks: KickService::new(kicks, accounts, policy),
            args,
        })
    }

    /// State backed by fresh in-memory stores
    pub fn in_memory(args: Args) -> Result<Self> {
        Self::new(
            args,
            Arc::new(MemoryAccountStore::new()),
            Arc::new(MemoryKickStore::new()),
        )
    }

    pub fn jwt(&self) -> &JwtValidator {
        self.accounts.jwt()
    }
}

pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Kicklist listening on {} (store: {})",
        state.args.listen,
        state.accounts.store_kind()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not expose this instance");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, Infallible> {
    let span = info_span!("request", id = %Uuid::new_v4());
    info!(parent: &span, "[{}] {} {}", addr, req.method(), req.uri().path());

    let response = dispatch(&state, req).instrument(span.clone()).await;

    info!(parent: &span, "-> {}", response.status());
    Ok(response)
}

/// Route one request to its handler. Every request yields exactly one
/// response; failures are already mapped to error bodies.
pub async fn dispatch<B>(state: &AppState, req: Request<B>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let origin = req.headers().get(header::ORIGIN).cloned();

    let mut response = if method == Method::OPTIONS {
        routes::preflight_response()
    } else if path == "/auth" || path.starts_with("/auth/") {
        routes::handle_auth_request(req, state).await
    } else if path == "/kicks" || path.starts_with("/kicks/") {
        routes::handle_kick_request(req, state).await
    } else {
        match (method, path.as_str()) {
            (Method::GET, "/health") => routes::health_check(state),
            (Method::GET, "/version") => routes::version_info(),
            (_, "/health") | (_, "/version") => {
                routes::error_response(KicklistError::MethodNotAllowed)
            }
            _ => routes::error_response(NotFoundError::Route(path.clone()).into()),
        }
    };

    routes::apply_cors(&mut response, origin.as_ref(), &state.allowed_origins);
    response
}
