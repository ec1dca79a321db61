use hyper::{Body, Method, StatusCode};
use juniper::http::GraphQLBatchRequest;
use std::{
    sync::Arc,
    time::Instant,
};

use crate::{api, prelude::*};
use super::{Context, Request, Response};


/// This is the main HTTP entry point, called for each incoming request.
pub(super) async fn handle(req: Request<Body>, ctx: Arc<Context>) -> Response {
    trace!(
        "Incoming HTTP {:?} request to '{}{}'",
        req.method(),
        req.uri().path(),
        req.uri().query().map(|q| format!("?{}", q)).unwrap_or_default(),
    );

    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/');

    match path {
        // The GraphQL endpoint. This is the only path for which POST is
        // allowed.
        "/graphql" if method == Method::POST => handle_api(req, &ctx).await,

        // The interactive GraphQL API explorer/IDE. We actually keep this in
        // production as it does not hurt and in particular: does not expose
        // any information that isn't already exposed by the API itself.
        "/graphiql" if method == Method::GET => graphiql(),

        _ => reply_404(&method, path),
    }
}

/// Handles a request to `/graphql`.
async fn handle_api(req: Request<Body>, ctx: &Context) -> Response {
    let before = Instant::now();

    let body = match hyper::body::to_bytes(req.into_body()).await {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to read body of API request: {}", e);
            return bad_request("could not read request body");
        }
    };

    let request = match serde_json::from_slice::<GraphQLBatchRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Failed to deserialize API request: {}", e);
            return bad_request("invalid GraphQL request body");
        }
    };

    let api_context = api::Context {
        store: Arc::clone(&ctx.store),
        identity: Arc::clone(&ctx.identity),
    };
    let response = request.execute(&*ctx.api_root, &api_context).await;

    // Per the GraphQL-over-HTTP convention (and `juniper_hyper`), requests
    // that fail before execution (e.g. wrong field names) get a 400, while
    // field errors during execution still result in a 200.
    let status = if response.is_ok() { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    let body = serde_json::to_string(&response)
        .expect("bug: failed to serialize GraphQL response");

    debug!("Finished /graphql query in {:.2?}", before.elapsed());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .expect("bug: invalid response")
}

/// Serves the interactive GraphQL explorer.
fn graphiql() -> Response {
    let html = juniper::http::graphiql::graphiql_source("/graphql", None);
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=UTF-8")
        .body(Body::from(html))
        .expect("bug: invalid response")
}

/// Replies with a 404 Not Found.
fn reply_404(method: &Method, path: &str) -> Response {
    debug!("Responding with 404 to {:?} '{}'", method, path);

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "text/plain; charset=UTF-8")
        .body(Body::from("404 Not found"))
        .expect("bug: invalid response")
}

fn bad_request(msg: &'static str) -> Response {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "text/plain; charset=UTF-8")
        .body(Body::from(msg))
        .expect("bug: invalid response")
}

pub(super) fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body("Internal server error".into())
        .expect("bug: invalid response")
}
