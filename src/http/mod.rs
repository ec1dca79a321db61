//! The HTTP server, handler and routes.
//!
//! This file itself contains fairly little business logic and just sets up the
//! `hyper` server and catches errors. The main logic is in `handlers.rs`.

use futures::FutureExt;
use hyper::{
    Body, Server,
    service::{make_service_fn, service_fn},
};
use std::{
    convert::Infallible,
    future::Future,
    net::{IpAddr, SocketAddr},
    panic::AssertUnwindSafe,
    sync::Arc,
};

use crate::{api, auth::Identity, config::Config, prelude::*, store::Store};
use self::handlers::{handle, internal_server_error};


mod handlers;


/// HTTP server configuration.
#[derive(Debug, Clone, confique::Config)]
pub(crate) struct HttpConfig {
    /// The TCP port the HTTP server should listen on.
    #[config(default = 4000)]
    pub(crate) port: u16,

    /// The bind address to listen on.
    #[config(default = "127.0.0.1")]
    pub(crate) address: IpAddr,
}


// Our requests and responses always use the hyper provided body type.
type Response<T = Body> = hyper::Response<T>;
type Request<T = Body> = hyper::Request<T>;


/// Context that the request handler has access to.
struct Context {
    api_root: Arc<api::RootNode>,
    store: Arc<dyn Store>,
    identity: Arc<Identity>,
}


/// Starts the HTTP server. The future returned by this function must be awaited
/// to actually run it.
pub(crate) async fn serve(
    config: &Config,
    api_root: api::RootNode,
    store: Arc<dyn Store>,
    identity: Arc<Identity>,
) -> Result<()> {
    let ctx = Arc::new(Context {
        api_root: Arc::new(api_root),
        store,
        identity,
    });

    // A hyper "service" is something that can handle requests. The outer
    // closure is called whenever hyper needs a new service instance (roughly
    // once per connection). The inner closure is actually called each time a
    // request is received. All our logic is encoded in the function `handle`.
    // The only thing we are doing here is to pass the context to that
    // function, and clone its `Arc` accordingly.
    let factory = make_service_fn(move |_| {
        let ctx = Arc::clone(&ctx);
        async {
            Ok::<_, Infallible>(service_fn(move |req| {
                handle_internal_errors(handle(req, Arc::clone(&ctx)))
            }))
        }
    });

    let addr = SocketAddr::new(config.http.address, config.http.port);
    let server = Server::bind(&addr).serve(factory);
    info!("Listening on http://{}", server.local_addr());
    server.await?;

    Ok(())
}

/// This just wraps another future and catches all panics that might occur when
/// resolving/polling that given future. This ensures that we always answer with
/// `500` instead of just crashing the thread and closing the connection.
async fn handle_internal_errors(
    future: impl Future<Output = Response>,
) -> Result<Response, Infallible> {
    // The `AssertUnwindSafe` is unfortunately necessary. What we are basically
    // saying here is: "if the future panicks, the global/remaining application
    // state is not 'broken'. It is safe to continue with the program in case
    // of a panic."
    //
    // Hyper catches panics for us anyway, so this changes nothing except that
    // our response is better.
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(response) => Ok(response),
        Err(panic) => {
            // The `panic` information is just an `Any` object representing the
            // value the panic was invoked with. For most panics (which use
            // `panic!` like `println!`), this is either `&str` or `String`.
            let msg = panic.downcast_ref::<String>()
                .map(|s| s.as_str())
                .or(panic.downcast_ref::<&str>().map(|s| *s));

            match msg {
                Some(msg) => error!("INTERNAL SERVER ERROR: HTTP handler panicked: '{}'", msg),
                None => error!("INTERNAL SERVER ERROR: HTTP handler panicked"),
            }

            Ok(internal_server_error())
        }
    }
}
