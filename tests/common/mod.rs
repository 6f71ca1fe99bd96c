//! Shared harness: an in-process stub vendor and a proxy wired to it

#![allow(dead_code)]

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::watch;
use trippe_gateway::infra::Metrics;
use trippe_gateway::io::{serve, ApiState, ZeptoMailClient};
use trippe_gateway::services::EmailDispatcher;

pub const TEST_API_KEY: &str = "Zoho-enczapikey test-key";
pub const TEST_TEMPLATE_KEY: &str = "tmpl-test";

/// A request as seen by the stub
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Bytes,
}

impl Captured {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// What the stub answers with
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body: body.to_string() }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self { status, body: body.to_string() }
    }
}

pub struct StubVendor {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl StubVendor {
    /// Serve `handler` on an ephemeral localhost port
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&Captured) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let log = captured.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let log = log.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let log = log.clone();
                        let handler = handler.clone();
                        async move {
                            let (parts, body) = req.into_parts();
                            let body = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();
                            let request = Captured {
                                method: parts.method.to_string(),
                                path: parts.uri.path().to_string(),
                                authorization: parts
                                    .headers
                                    .get("authorization")
                                    .and_then(|v| v.to_str().ok())
                                    .map(str::to_string),
                                body,
                            };
                            let reply = handler(&request);
                            log.lock().unwrap().push(request);

                            Ok::<_, Infallible>(
                                Response::builder()
                                    .status(reply.status)
                                    .header("Content-Type", "application/json")
                                    .body(Full::new(Bytes::from(reply.body)))
                                    .unwrap(),
                            )
                        }
                    });
                    let _ = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await;
                });
            }
        });

        Self { addr, captured }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

/// A running proxy
pub struct Proxy {
    pub addr: SocketAddr,
    pub metrics: Arc<Metrics>,
    shutdown: watch::Sender<bool>,
}

impl Proxy {
    /// Start a proxy whose mailer posts to `api_url`
    pub async fn start(api_url: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let metrics = Arc::new(Metrics::new());

        let dispatcher = EmailDispatcher::new(
            ZeptoMailClient::new(api_url, TEST_API_KEY),
            "noreply@trippechalo.in",
            "TrippeChalo",
            TEST_TEMPLATE_KEY,
        );
        let state = Arc::new(ApiState::new(
            dispatcher,
            metrics.clone(),
            "ZeptoMail Proxy Server",
            "*",
            16 * 1024,
        ));

        let (shutdown, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            let _ = serve(listener, state, shutdown_rx).await;
        });

        Self { addr, metrics, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// ZeptoMail's accepted-send answer carrying `message_id`
pub fn zepto_accepted(message_id: &str) -> Value {
    serde_json::json!({
        "data": [{
            "code": "EM_104",
            "additional_info": [{"message_id": message_id}],
            "message": "Email request received"
        }],
        "message": "OK",
        "object": "email",
        "request_id": "2d6f.7c4a"
    })
}

pub fn full_request() -> Value {
    serde_json::json!({
        "eventName": "Hampta Pass Trek",
        "customerName": "Asha Verma",
        "customerEmail": "asha@example.com",
        "eventDate": "Monday, December 16, 2024",
        "eventAddress": "Manali, Himachal Pradesh"
    })
}
