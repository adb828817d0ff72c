//! HTTP surface for the stats service.
//!
//! | route               | body             | response                    |
//! |---------------------|------------------|-----------------------------|
//! | `POST /stats/read`  | `ReadRequest`    | `ReadResponse`              |
//! | `POST /stats/write` | ignored          | 400, not implemented        |
//! | `POST /stats/stream`| ignored          | 400, not implemented        |
//! | `GET /health`       |                  | `OK`                        |
//!
//! An empty read body is the same as `{}`: current stats for every service.
//! Read bodies are capped at [`MAX_BODY_BYTES`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use statswatch_collector::{ReadRequest, StatsError, StatsHandler, StreamRequest, WriteRequest};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Serves a [`StatsHandler`] over HTTP/1.
#[derive(Debug)]
pub struct StatsServer {
    listener: TcpListener,
    handler: StatsHandler,
}

impl StatsServer {
    /// Bind the listening socket.
    pub async fn bind(addr: SocketAddr, handler: StatsHandler) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, handler })
    }

    /// The address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` completes.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> std::io::Result<()> {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "stats server listening");
        }
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                _ = &mut shutdown => break,
            };
            let io = TokioIo::new(stream);
            let handler = self.handler.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let handler = handler.clone();
                    async move { handle_request(req, &handler).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(%peer, error = %e, "connection error");
                }
            });
        }

        info!("stats server stopped");
        Ok(())
    }
}

async fn handle_request(
    req: Request<Incoming>,
    handler: &StatsHandler,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/stats/read") => {
            match read_json::<ReadRequest, _>(req.into_body()).await {
                Ok(request) => json_response(StatusCode::OK, &handler.read(&request)),
                Err(rsp) => rsp,
            }
        }
        // Rejected whatever the body holds, so it is never read.
        (&Method::POST, "/stats/write") => {
            empty_or_error(handler.write(&WriteRequest::default()))
        }
        (&Method::POST, "/stats/stream") => {
            empty_or_error(handler.stream(&StreamRequest::default()))
        }
        (&Method::GET, "/health" | "/healthz") => respond(StatusCode::OK, TEXT, "OK"),
        (_, "/stats/read" | "/stats/write" | "/stats/stream" | "/health" | "/healthz") => {
            respond(StatusCode::METHOD_NOT_ALLOWED, TEXT, "Method Not Allowed")
        }
        _ => respond(StatusCode::NOT_FOUND, TEXT, "Not Found"),
    };

    debug!(%method, %path, status = response.status().as_u16(), "request handled");
    Ok(response)
}

/// Decode a JSON body; an empty body decodes as `{}`.
async fn read_json<T, B>(body: B) -> Result<T, Response<Full<Bytes>>>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(respond(
                StatusCode::PAYLOAD_TOO_LARGE,
                TEXT,
                format!("request body exceeds {MAX_BODY_BYTES} bytes"),
            ));
        }
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            return Err(respond(StatusCode::BAD_REQUEST, TEXT, "unreadable body"));
        }
    };

    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body
    };

    serde_json::from_slice(body).map_err(|e| {
        respond(
            StatusCode::BAD_REQUEST,
            TEXT,
            format!("invalid request body: {e}"),
        )
    })
}

fn empty_or_error(result: Result<(), StatsError>) -> Response<Full<Bytes>> {
    match result {
        Ok(()) => respond(StatusCode::NO_CONTENT, TEXT, Bytes::new()),
        Err(e) => stats_error(&e),
    }
}

/// Error body in the `{id, code, detail, status}` shape service errors use.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    id: &'a str,
    code: u16,
    detail: String,
    status: &'a str,
}

fn stats_error(err: &StatsError) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    let id = match err {
        StatsError::NotImplemented { id, .. } => *id,
    };
    let body = ErrorBody {
        id,
        code: status.as_u16(),
        detail: err.to_string(),
        status: status.canonical_reason().unwrap_or("Bad Request"),
    };
    json_response(status, &body)
}

fn json_response(status: StatusCode, value: &impl Serialize) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => respond(status, JSON, body),
        Err(e) => respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            TEXT,
            format!("failed to encode response: {e}"),
        ),
    }
}

fn respond(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
