//! Outbound HTTP transport.
//!
//! The executor talks to the network only through [`Transport`], which keeps
//! deadline and retry logic testable without sockets.

use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// The request never produced a response.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Sends one HTTP request and yields the response head with a streaming body.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, TransportError>> + Send;
}

/// Pooled hyper client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

impl Transport for HyperTransport {
    fn send(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, TransportError>> + Send {
        let response = self.client.request(request);
        async move {
            let response = response
                .await
                .map_err(|e| TransportError(error_chain(&e)))?;
            Ok(response.map(Body::new))
        }
    }
}

/// Flatten an error and its sources; hyper's top-level messages are terse.
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
