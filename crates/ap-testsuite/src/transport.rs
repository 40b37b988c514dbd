//! Transport layer for dereferencing identifiers

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::{DereferenceError, TransportError, TransportResult};

pub mod http;

pub use http::HttpTransport;

/// ActivityStreams media type
pub const ACTIVITY_TYPE: &str = "application/activity+json";

/// JSON-LD media type carrying the ActivityStreams profile
pub const PROFILE_TYPE: &str =
    r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams""#;

/// `Accept` header selection for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accept {
    /// `application/activity+json`
    ActivityStreams,
    /// `application/ld+json` with the ActivityStreams profile
    LinkedDataProfile,
    /// Leave `Accept` to the HTTP client (webfinger)
    Default,
}

impl Accept {
    /// Pick the negotiated media type
    pub fn for_profile(with_profile: bool) -> Self {
        if with_profile {
            Self::LinkedDataProfile
        } else {
            Self::ActivityStreams
        }
    }

    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Self::ActivityStreams => Some(ACTIVITY_TYPE),
            Self::LinkedDataProfile => Some(PROFILE_TYPE),
            Self::Default => None,
        }
    }
}

/// Outcome of a single dereference.
///
/// A non-success status is an answer, not a fault: several checks expect it.
#[derive(Debug, Clone, PartialEq)]
pub enum Dereferenced {
    /// 2xx with a JSON body
    Object(Value),
    /// Non-2xx status
    Rejected(DereferenceError),
}

impl Dereferenced {
    pub fn into_result(self) -> Result<Value, DereferenceError> {
        match self {
            Self::Object(obj) => Ok(obj),
            Self::Rejected(err) => Err(err),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }
}

/// Transport trait for content-negotiated GETs.
///
/// Implementations perform exactly one request per call, with no retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `iri` with the given `Accept` selection
    async fn fetch(&self, iri: &str, accept: Accept) -> TransportResult<Dereferenced>;

    /// Dereference `iri`, negotiating either `application/activity+json` or
    /// the JSON-LD ActivityStreams profile
    async fn get(&self, iri: &str, with_profile: bool) -> TransportResult<Dereferenced> {
        self.fetch(iri, Accept::for_profile(with_profile)).await
    }

    /// Look up `user` (`name@host`) on `server` via webfinger
    async fn webfinger(&self, server: &Url, user: &str) -> TransportResult<Dereferenced> {
        let url = webfinger_url(server, user)?;
        self.fetch(url.as_str(), Accept::Default).await
    }
}

/// Build `{server}/.well-known/webfinger?resource=acct:{user}`
pub fn webfinger_url(server: &Url, user: &str) -> TransportResult<Url> {
    let mut url = server
        .join("/.well-known/webfinger")
        .map_err(|source| TransportError::InvalidUrl {
            iri: server.to_string(),
            source,
        })?;
    url.query_pairs_mut()
        .append_pair("resource", &format!("acct:{user}"));
    Ok(url)
}
