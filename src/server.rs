//! HTTP endpoint serving the metrics registry
//!
//! Minimal hyper HTTP/1 server: the configured path answers with the
//! Prometheus text exposition of the registry, everything else is 404.
//! Scrapes may overlap a running probe cycle; the gauges themselves are
//! internally synchronized.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Fatal metrics-endpoint failure
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("unable to bind metrics endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Serve `registry` on `port` at `path` until the token is cancelled.
pub async fn serve(
    registry: Registry,
    port: u16,
    path: String,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(%addr, path = %path, "metrics endpoint listening");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("metrics endpoint stopped");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, _) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!("metrics endpoint accept error: {}", e);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let registry = registry.clone();
                let path = path.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let response = render(&registry, &path, &req);
                        async move { Ok::<_, std::convert::Infallible>(response) }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        tracing::debug!("metrics connection error: {}", e);
                    }
                });
            }
        }
    }
}

fn render(
    registry: &Registry,
    path: &str,
    req: &Request<hyper::body::Incoming>,
) -> Response<Full<Bytes>> {
    if req.uri().path() != path {
        return Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from_static(b"not found")))
            .expect("static 404 response");
    }

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    match encoder.encode(&registry.gather(), &mut buffer) {
        Ok(()) => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", encoder.format_type())
            .body(Full::new(Bytes::from(buffer)))
            .expect("encoded metrics response"),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from_static(b"encoding error")))
                .expect("static 500 response")
        }
    }
}
