//! Scripted transport for unit tests.

use axum::body::Body;
use axum::http::{Request, Response};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::http::X_REQUEST_ID;
use crate::upstream::transport::{Transport, TransportError};

/// What the scripted transport does for one request.
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(u16, &'static str),
    Fail(&'static str),
    /// Never answers.
    Hang,
}

/// Plays back [`Scripted`] steps in order, then answers `200 []`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<AtomicUsize>,
    request_ids: Arc<Mutex<Vec<Option<String>>>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into_iter().collect())),
            ..Self::default()
        }
    }

    pub fn push(&self, step: Scripted) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn request_ids(&self) -> Vec<Option<String>> {
        self.request_ids.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, TransportError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.request_ids.lock().unwrap().push(
            request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::Respond(200, "[]"));

        async move {
            match step {
                Scripted::Respond(status, body) => Ok(Response::builder()
                    .status(status)
                    .body(Body::from(body))
                    .unwrap()),
                Scripted::Fail(message) => Err(TransportError(message.to_string())),
                Scripted::Hang => std::future::pending().await,
            }
        }
    }
}
