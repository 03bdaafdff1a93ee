//! Request dispatcher.
//!
//! Every request takes one snapshot of the route table and then runs
//! match → handler → render → send against it, so a table swapped in by a
//! rebuild never affects a request already in flight.

use arc_swap::ArcSwap;
use atoll_core::render::error_page;
use atoll_core::{
    HandlerError, Method, RenderComposer, RenderContext, Reply, RequestContext, ResponseParts,
    RouteTable,
};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_TYPE, HeaderValue};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// URL prefix of the browser build output
pub const PUBLIC_PREFIX: &str = "/public";

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const HTML: &str = "text/html; charset=utf-8";

#[derive(Clone)]
pub struct Dispatcher {
    routes: Arc<ArcSwap<RouteTable>>,
    composer: Arc<RenderComposer>,
    public: ServeDir,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.load().len())
            .field("generation", &self.routes.load().generation())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// `client_dir` is served under `/public`.
    pub fn new(routes: RouteTable, composer: RenderComposer, client_dir: impl AsRef<Path>) -> Self {
        Self {
            routes: Arc::new(ArcSwap::from_pointee(routes)),
            composer: Arc::new(composer),
            public: ServeDir::new(client_dir),
        }
    }

    /// Current route table
    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    /// Swap in a rebuilt table; requests already running keep the old one.
    pub fn replace_routes(&self, routes: RouteTable) {
        tracing::debug!(
            generation = routes.generation(),
            routes = routes.len(),
            "route table replaced"
        );
        self.routes.store(Arc::new(routes));
    }

    pub fn router(&self) -> Router {
        Router::new().fallback(dispatch).with_state(self.clone())
    }

    async fn serve_public(&self, request: Request) -> Response {
        let (mut parts, body) = request.into_parts();
        let rest = parts
            .uri
            .path()
            .strip_prefix(PUBLIC_PREFIX)
            .unwrap_or_default()
            .to_string();
        let rewritten = match parts.uri.query() {
            Some(query) => format!("{rest}?{query}"),
            None => rest,
        };
        parts.uri = match rewritten.parse::<Uri>() {
            Ok(uri) => uri,
            Err(_) => return status_page(StatusCode::BAD_REQUEST, "Malformed path"),
        };

        match self.public.clone().oneshot(Request::from_parts(parts, body)).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        }
    }
}

fn status_page(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(CONTENT_TYPE, HTML)],
        error_page(status.as_u16(), message),
    )
        .into_response()
}

fn is_public(path: &str) -> bool {
    path.strip_prefix(PUBLIC_PREFIX)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Apply the status and headers a handler set on its context
fn apply_parts(mut response: Response, parts: ResponseParts) -> Response {
    if let Some(status) = parts.status {
        *response.status_mut() = status;
    }
    response.headers_mut().extend(parts.headers);
    response
}

async fn dispatch(State(dispatcher): State<Dispatcher>, request: Request) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let table = dispatcher.routes();
    let matched = Method::from_http(&method).and_then(|m| {
        table
            .match_route(m, &path)
            .map(|found| (found.handler.clone(), found.params))
    });

    let response = match matched {
        Some((handler, params)) => {
            let (parts, body) = request.into_parts();
            match to_bytes(body, MAX_BODY_BYTES).await {
                Ok(body) => {
                    let cx = RequestContext::new(parts.method, parts.uri, parts.headers, params, body);
                    let response_parts = cx.response_parts();
                    let composer = dispatcher.composer.clone();
                    let render_path = path.clone();
                    let run = async move {
                        let reply = handler.call(cx).await?;
                        let parts = std::mem::take(&mut *response_parts.lock());
                        Ok::<_, HandlerError>(respond(reply, parts, &composer, &render_path))
                    };
                    match AssertUnwindSafe(run).catch_unwind().await {
                        Ok(Ok(response)) => response,
                        Ok(Err(HandlerError::BadRequest(message))) => {
                            tracing::debug!(%method, %path, %message, "bad request");
                            status_page(StatusCode::BAD_REQUEST, &message)
                        }
                        Ok(Err(err)) => {
                            tracing::error!(%method, %path, error = %err, "handler failed");
                            status_page(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                        }
                        Err(_) => {
                            tracing::error!(%method, %path, "handler panicked");
                            status_page(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                        }
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "failed to read request body");
                    status_page(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                }
            }
        }
        None if is_public(&path) => dispatcher.serve_public(request).await,
        None => status_page(StatusCode::NOT_FOUND, "Not Found"),
    };

    tracing::debug!(
        %method,
        %path,
        status = response.status().as_u16(),
        generation = table.generation(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "request"
    );
    response
}

/// Turn a handler reply into the final response
fn respond(reply: Reply, parts: ResponseParts, composer: &RenderComposer, path: &str) -> Response {
    match reply {
        Reply::Response(response) => response,
        Reply::Component(component) => {
            let html = composer.compose(&*component, &RenderContext::new(path, &parts.metadata));
            let mut response = Response::new(Body::from(html));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(HTML));
            apply_parts(response, parts)
        }
        Reply::Empty => apply_parts(Response::new(Body::empty()), parts),
    }
}
