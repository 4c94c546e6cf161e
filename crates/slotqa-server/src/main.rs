//! Slot QA tracker API server
//!
//! Usage: `slotqa-server [config.ron]` (defaults to `config/server.ron`).
//! `RUST_LOG` overrides the configured log level.

use chrono::Utc;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::COOKIE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use slotqa_core::Catalog;
use slotqa_db::Store;
use slotqa_server::api::{dispatch, ApiRequest, AppState};
use slotqa_server::config::Config;
use slotqa_server::response;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Read the body, then run the synchronous dispatcher on a blocking thread
async fn handle_request(
    state: Arc<AppState>,
    max_body: usize,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let (parts, body) = req.into_parts();

    let body = match Limited::new(body, max_body).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Ok(response::error(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!("request body exceeds {} bytes", max_body),
            ));
        }
        Err(e) => {
            return Ok(response::error(
                StatusCode::BAD_REQUEST,
                &format!("failed to read request body: {}", e),
            ));
        }
    };

    let request = ApiRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        cookie: parts
            .headers
            .get(COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };

    match tokio::task::spawn_blocking(move || dispatch(&state, &request)).await {
        Ok(response) => Ok(response.into_response()),
        Err(e) => {
            warn!(error = %e, "request handler panicked");
            Ok(response::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "request handler failed",
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/server.ron".to_string());
    let config = Config::load(&config_path)?;

    init_tracing(&config.log_level);
    info!(path = %config_path, "loaded configuration");

    let store = match &config.database {
        Some(path) => Store::open(path)?,
        None => {
            warn!("no database configured, data lives in memory only");
            Store::in_memory()?
        }
    };

    let catalog = Catalog::builtin()?;
    info!(packages = catalog.len(), "loaded package catalog");

    if let Some(admin) = &config.bootstrap_admin {
        if store.ensure_admin(&admin.username, &admin.password, Utc::now())? {
            info!(username = %admin.username, "created bootstrap admin");
        }
    }

    let state = Arc::new(AppState::new(store, catalog, config.session_ttl())?);
    let max_body = config.max_body_bytes;

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    loop {
        let (stream, remote_addr) = tokio::select! {
            conn = listener.accept() => match conn {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept error");
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(state, max_body, req).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%remote_addr, error = %e, "connection error");
            }
        });
    }

    Ok(())
}
