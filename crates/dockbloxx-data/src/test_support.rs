//! A scripted HTTP server for client tests.
//!
//! Every request, whatever its route, gets the next canned response in
//! order. The server shuts down gracefully when the handle is dropped.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A response waiting to be served.
#[derive(Debug, Clone)]
pub(crate) struct Canned {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: String,
}

impl IntoResponse for Canned {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in self.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(&value).unwrap(),
            );
        }
        response
    }
}

/// `200 OK` JSON with extra headers.
pub(crate) fn json_response(headers: &[(&str, &str)], body: &str) -> Canned {
    Canned {
        status: StatusCode::OK,
        headers: headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        body: body.to_string(),
    }
}

/// JSON error body with the given status.
pub(crate) fn error_response(status: u16, body: &str) -> Canned {
    Canned {
        status: StatusCode::from_u16(status).unwrap(),
        headers: Vec::new(),
        body: body.to_string(),
    }
}

/// Empty body with the given status.
pub(crate) fn status_response(status: u16) -> Canned {
    error_response(status, "")
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Canned>,
    requests: Vec<String>,
}

type SharedScript = Arc<Mutex<Script>>;

pub(crate) struct TestServer {
    pub base_url: String,
    script: SharedScript,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    /// `METHOD /path?query` for each request, in arrival order.
    pub fn request_lines(&self) -> Vec<String> {
        self.script.lock().unwrap().requests.clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn reply(
    State(script): State<SharedScript>,
    method: Method,
    uri: Uri,
    _body: Bytes,
) -> Response {
    let next = {
        let mut script = script.lock().unwrap();
        script.requests.push(format!("{} {}", method, uri));
        script.responses.pop_front()
    };
    match next {
        Some(canned) => canned.into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "no scripted response left").into_response(),
    }
}

/// Serve `responses` in order, one per request.
pub(crate) async fn serve(responses: Vec<Canned>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let script = Arc::new(Mutex::new(Script {
        responses: responses.into(),
        ..Script::default()
    }));

    let router = Router::new().fallback(reply).with_state(Arc::clone(&script));
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    TestServer {
        base_url: format!("http://{}", addr),
        script,
        shutdown: Some(shutdown_tx),
    }
}
