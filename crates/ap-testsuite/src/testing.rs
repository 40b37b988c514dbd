//! In-memory transport for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{DereferenceError, TransportError, TransportResult};
use crate::transport::{Accept, Dereferenced, Transport};

/// Canned answer for one IRI
#[derive(Debug, Clone)]
pub enum Reply {
    Object(Value),
    Status(u16),
    Timeout,
}

/// Transport serving canned replies and recording every call.
///
/// Replies registered for a specific `Accept` take precedence over ones
/// registered for the IRI alone. Unknown IRIs answer 404.
#[derive(Debug, Default)]
pub struct FakeTransport {
    replies: HashMap<String, Reply>,
    negotiated: HashMap<(String, Accept), Reply>,
    calls: Mutex<Vec<(String, Accept)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, iri: &str, reply: Reply) -> Self {
        self.replies.insert(iri.to_string(), reply);
        self
    }

    pub fn with_accept(mut self, iri: &str, accept: Accept, reply: Reply) -> Self {
        self.negotiated.insert((iri.to_string(), accept), reply);
        self
    }

    pub fn calls(&self) -> Vec<(String, Accept)> {
        self.calls.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, iri: &str, accept: Accept) -> TransportResult<Dereferenced> {
        self.calls.lock().push((iri.to_string(), accept));

        let reply = self
            .negotiated
            .get(&(iri.to_string(), accept))
            .or_else(|| self.replies.get(iri))
            .cloned()
            .unwrap_or(Reply::Status(404));

        match reply {
            Reply::Object(obj) => Ok(Dereferenced::Object(obj)),
            Reply::Status(code) => {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Ok(Dereferenced::Rejected(DereferenceError::new(status, iri)))
            }
            Reply::Timeout => Err(TransportError::Timeout {
                iri: iri.to_string(),
            }),
        }
    }
}
