//! Flow HTTP server using hyper 1.x.
//!
//! One tokio task per connection. Every response is JSON with permissive
//! CORS headers so a browser client on another origin can call the flows.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use st_core::constants;
use st_core::error::{StError, StResult};
use st_flows::event_bus::{event_label, AppEvent};
use st_flows::{EventBus, FlowRegistry};

use crate::auth::FlowAuth;

type BoxBody = http_body_util::combinators::UnsyncBoxBody<Bytes, Infallible>;

/// Largest request body accepted on `POST /flows/{name}`.
const MAX_BODY_BYTES: usize = 1024 * 1024;

const FLOWS_PREFIX: &str = "/flows/";

/// Shared context passed to every request handler.
struct ServerContext {
    auth: FlowAuth,
    registry: FlowRegistry,
    active_connections: AtomicU32,
}

/// A bound, not yet serving, flow server.
pub struct FlowServer {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
}

impl FlowServer {
    /// Bind the listener. Port 0 picks a free port.
    pub async fn bind(addr: &str, auth: FlowAuth, registry: FlowRegistry) -> StResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| StError::Config(format!("failed to bind flow server on {addr}: {e}")))?;
        Ok(Self {
            listener,
            ctx: Arc::new(ServerContext {
                auth,
                registry,
                active_connections: AtomicU32::new(0),
            }),
        })
    }

    pub fn local_addr(&self) -> StResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown_rx` flips to true.
    pub async fn serve(self, mut shutdown_rx: watch::Receiver<bool>) -> StResult<()> {
        info!("flow server listening on http://{}", self.local_addr()?);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, remote)) => {
                            let ctx = self.ctx.clone();
                            debug!("connection from {remote}");
                            tokio::task::spawn(async move {
                                ctx.active_connections.fetch_add(1, Ordering::Relaxed);
                                let svc_ctx = ctx.clone();
                                let svc = service_fn(move |req| {
                                    let ctx = svc_ctx.clone();
                                    async move { handle_request(req, ctx).await }
                                });
                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(hyper_util::rt::TokioIo::new(stream), svc)
                                    .await
                                {
                                    debug!("connection error: {e}");
                                }
                                ctx.active_connections.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            warn!("accept error: {e}");
                        }
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("flow server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Log every application event until the bus closes.
pub fn spawn_event_logger(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match &event {
                    AppEvent::PermissionDenied { operation, path, source } => {
                        warn!("{source}: permission denied for {operation} on {path}");
                    }
                    AppEvent::FlowFailed { flow, error } => {
                        warn!("flow {flow} failed: {error}");
                    }
                    other => info!("event {}: {other:?}", event_label(other)),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("event logger lagged, skipped {n} event(s)");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Route an incoming HTTP request.
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    ctx: Arc<ServerContext>,
) -> Result<Response<BoxBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // CORS preflight
    if method == Method::OPTIONS {
        return Ok(cors_response(empty_response(StatusCode::NO_CONTENT)));
    }

    if method == Method::GET && path == "/health" {
        return Ok(cors_response(json_response(
            StatusCode::OK,
            &json!({
                "status": "ok",
                "version": constants::APP_VERSION,
                "activeConnections": ctx.active_connections.load(Ordering::Relaxed),
            }),
        )));
    }

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !ctx.auth.validate(auth_header).await {
        warn!("unauthorized request to {path}");
        return Ok(cors_response(error_response(StatusCode::UNAUTHORIZED, "unauthorized")));
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/flows") => json_response(
            StatusCode::OK,
            &json!({ "flows": ctx.registry.definitions() }),
        ),
        (Method::POST, p) if p.starts_with(FLOWS_PREFIX) => {
            let name = p[FLOWS_PREFIX.len()..].trim_end_matches('/').to_string();
            handle_flow(req, &name, &ctx).await
        }
        _ => error_response(StatusCode::NOT_FOUND, "not found"),
    };

    Ok(cors_response(response))
}

/// Handle `POST /flows/{name}`.
async fn handle_flow(
    req: Request<hyper::body::Incoming>,
    name: &str,
    ctx: &ServerContext,
) -> Response<BoxBody> {
    if !ctx.registry.contains(name) {
        return error_response(StatusCode::NOT_FOUND, &format!("unknown flow: {name}"));
    }

    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > MAX_BODY_BYTES) {
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
    }

    let body_bytes = match read_limited(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };

    let args: Value = if body_bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(serde_json::Map::new())
    } else {
        match serde_json::from_slice(&body_bytes) {
            Ok(v) => v,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, &format!("invalid JSON: {e}"));
            }
        }
    };

    match ctx.registry.execute(name, args).await {
        Ok(output) => json_response(StatusCode::OK, &output),
        Err(e) => {
            let status = StatusCode::from_u16(e.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, &e.to_string())
        }
    }
}

/// Collect a request body, stopping at `MAX_BODY_BYTES`.
async fn read_limited<B>(body: B) -> Result<Bytes, Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "request body too large",
        )),
        Err(e) => Err(error_response(
            StatusCode::BAD_REQUEST,
            &format!("failed to read body: {e}"),
        )),
    }
}

// ─── Response Helpers ────────────────────────────────────────────────────────

fn empty_body() -> BoxBody {
    BoxBody::new(Full::new(Bytes::new()).map_err(|never| match never {}))
}

fn full_body(s: String) -> BoxBody {
    BoxBody::new(Full::new(Bytes::from(s)).map_err(|never| match never {}))
}

fn empty_response(status: StatusCode) -> Response<BoxBody> {
    let mut resp = Response::new(empty_body());
    *resp.status_mut() = status;
    resp
}

fn json_response(status: StatusCode, body: &Value) -> Response<BoxBody> {
    let mut resp = Response::new(full_body(body.to_string()));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

fn error_response(status: StatusCode, message: &str) -> Response<BoxBody> {
    json_response(status, &json!({ "error": message }))
}

fn cors_response(mut resp: Response<BoxBody>) -> Response<BoxBody> {
    let headers = resp.headers_mut();
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("authorization, content-type"),
    );
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let resp = error_response(StatusCode::NOT_FOUND, "nope");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_read_limited_rejects_oversized_body() {
        let big = Full::new(Bytes::from(vec![b' '; MAX_BODY_BYTES + 1]));
        let resp = read_limited(big).await.unwrap_err();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let small = Full::new(Bytes::from_static(b"{}"));
        assert_eq!(read_limited(small).await.unwrap(), Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_cors_headers() {
        let resp = cors_response(empty_response(StatusCode::NO_CONTENT));
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}
