//! HTTP surface of the email proxy
//!
//! Routes:
//! - `POST /api/send-registration-email` - validate, map, forward to the mailer
//! - `GET /health` - liveness
//! - `GET /metrics` - Prometheus text
//! - `OPTIONS *` - CORS preflight
//!
//! Uses hyper directly, one task per connection.

use crate::infra::metrics::{DispatchOutcome, Metrics};
use crate::io::prometheus::format_prometheus_metrics;
use crate::io::zeptomail::Mailer;
use crate::services::email_dispatch::{DispatchResponse, EmailDispatcher};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const SEND_REGISTRATION_EMAIL_PATH: &str = "/api/send-registration-email";

/// Everything a request handler needs, shared across connections
pub struct ApiState<M: Mailer> {
    dispatcher: EmailDispatcher<M>,
    metrics: Arc<Metrics>,
    service_name: String,
    cors_allow_origin: String,
    max_body_bytes: usize,
}

impl<M: Mailer> ApiState<M> {
    pub fn new(
        dispatcher: EmailDispatcher<M>,
        metrics: Arc<Metrics>,
        service_name: &str,
        cors_allow_origin: &str,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            dispatcher,
            metrics,
            service_name: service_name.to_string(),
            cors_allow_origin: cors_allow_origin.to_string(),
            max_body_bytes,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
    service: &'a str,
}

fn json_response<T: Serialize>(status: StatusCode, body: &T, cors: &str) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(body)
        .unwrap_or_else(|_| br#"{"success":false,"error":"Internal server error"}"#.to_vec());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", cors)
        .body(Full::new(Bytes::from(body)))
        .expect("static response should not fail")
}

fn preflight_response(cors: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", cors)
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Full::new(Bytes::new()))
        .expect("static response should not fail")
}

async fn send_registration_email<M: Mailer>(
    req: Request<hyper::body::Incoming>,
    state: &ApiState<M>,
) -> Response<Full<Bytes>> {
    state.metrics.record_email_request();
    let cors = state.cors_allow_origin.as_str();

    let body = match Limited::new(req.into_body(), state.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "email_request_body_unreadable");
            state.metrics.record_outcome(DispatchOutcome::Rejected);
            return json_response(
                StatusCode::BAD_REQUEST,
                &DispatchResponse::failed(format!("Unreadable request body: {e}")),
                cors,
            );
        }
    };

    match state.dispatcher.dispatch_body(&body).await {
        Ok(receipt) => {
            state.metrics.record_vendor_latency(receipt.latency_ms);
            state.metrics.record_outcome(DispatchOutcome::Sent);
            json_response(StatusCode::OK, &DispatchResponse::sent(receipt), cors)
        }
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let outcome = e.outcome();
            if let Some(latency_ms) = e.vendor_latency_ms() {
                state.metrics.record_vendor_latency(latency_ms);
            }
            state.metrics.record_outcome(outcome);

            if outcome == DispatchOutcome::Rejected {
                warn!(status = %status.as_u16(), error = %e, "email_request_rejected");
            } else {
                error!(status = %status.as_u16(), error = %e, "email_dispatch_failed");
            }
            json_response(status, &DispatchResponse::failed(e.client_message()), cors)
        }
    }
}

/// Route one request
async fn handle_request<M: Mailer>(
    req: Request<hyper::body::Incoming>,
    state: Arc<ApiState<M>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let cors = state.cors_allow_origin.as_str();

    let response = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => preflight_response(cors),
        (&Method::POST, SEND_REGISTRATION_EMAIL_PATH) => send_registration_email(req, &state).await,
        (_, SEND_REGISTRATION_EMAIL_PATH) => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &DispatchResponse::failed("Method not allowed"),
            cors,
        ),
        (&Method::GET, "/health") => json_response(
            StatusCode::OK,
            &HealthResponse { status: "OK", service: &state.service_name },
            cors,
        ),
        (&Method::GET, "/metrics") => {
            let body = format_prometheus_metrics(&state.metrics.snapshot(), &state.service_name);
            Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
                .body(Full::new(Bytes::from(body)))
                .expect("static response should not fail")
        }
        _ => json_response(StatusCode::NOT_FOUND, &DispatchResponse::failed("Not Found"), cors),
    };

    info!(status = %response.status().as_u16(), "request_completed");
    Ok(response)
}

/// Accept connections on an already-bound listener until shutdown
pub async fn serve<M: Mailer + 'static>(
    listener: TcpListener,
    state: Arc<ApiState<M>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, service = %state.service_name, "api_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let io = TokioIo::new(stream);
                        let state = state.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                                let state = state.clone();
                                let span = info_span!(
                                    "request",
                                    request_id = %Uuid::now_v7(),
                                    method = %req.method(),
                                    path = %req.uri().path(),
                                    peer = %peer,
                                );
                                async move { handle_request(req, state).await }.instrument(span)
                            });

                            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                error!(error = %e, "api_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "api_accept_error");
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("api_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}

/// Bind `addr` and serve the API
pub async fn start_api_server<M: Mailer + 'static>(
    addr: SocketAddr,
    state: Arc<ApiState<M>>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state, shutdown).await
}
