//! Conformance test cases
//!
//! Every case reads its parameters from the [`TestContext`] and talks to the
//! server only through a [`Transport`]. `run` never fails: faults are logged
//! and turned into a failing result.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info};
use url::Url;

use crate::context::TestContext;
use crate::identifier::link_iri;
use crate::transport::{Dereferenced, Transport};

/// Outbox collection types accepted for an actor's outbox
const OUTBOX_TYPES: [&str; 2] = ["OrderedCollection", "OrderedCollectionPage"];

const PAGE_TYPE: &str = "OrderedCollectionPage";

/// A single conformance check
#[async_trait]
pub trait TestCase: Send + Sync {
    /// Name used in reports
    fn name(&self) -> &'static str;

    /// True when the parameters this case needs are unset
    fn skip(&self, _ctx: &TestContext) -> bool {
        false
    }

    /// Perform the check; `true` means pass
    async fn run(&self, ctx: &TestContext, transport: &dyn Transport) -> bool;
}

/// The standard suite: reachability checks first, then negative results
pub fn standard_suite() -> Vec<Box<dyn TestCase>> {
    vec![
        Box::new(ActorTest),
        Box::new(ObjectTest),
        Box::new(DeletedObject),
        Box::new(InvalidObject),
        Box::new(PrivateObject),
    ]
}

fn skip_unset(id: Option<&Url>, what: &str) -> bool {
    if id.is_none() {
        info!("Skipping; {} ID not configured", what);
        return true;
    }
    false
}

fn type_of(obj: &Value) -> Option<&str> {
    obj.get("type").and_then(Value::as_str)
}

/// Dereference `iri`, logging anything other than an object
async fn dereference(
    transport: &dyn Transport,
    iri: &str,
    with_profile: bool,
    what: &str,
) -> Option<Value> {
    match transport.get(iri, with_profile).await {
        Ok(Dereferenced::Object(obj)) => Some(obj),
        Ok(Dereferenced::Rejected(err)) => {
            error!("Failed to get {} {}: HTTP {}", what, iri, err.status);
            None
        }
        Err(err) => {
            error!("Failed to get {} {}: {}", what, iri, err);
            None
        }
    }
}

/// Require that dereferencing `iri` is refused with exactly `expected`
async fn expect_status(
    transport: &dyn Transport,
    iri: &Url,
    expected: StatusCode,
    what: &str,
) -> bool {
    info!("Dereference {}", what);
    match transport.get(iri.as_str(), false).await {
        Ok(Dereferenced::Object(_)) => {
            error!(
                "Successfully fetched the object. \
                 Are you sure you specified the correct object id?"
            );
            false
        }
        Ok(Dereferenced::Rejected(err)) if err.status != expected => {
            error!(
                "Invalid status code {}; expected {}",
                err.status.as_u16(),
                expected.as_u16()
            );
            false
        }
        Ok(Dereferenced::Rejected(_)) => true,
        Err(err) => {
            error!("Failed to dereference {} {}: {}", what, iri, err);
            false
        }
    }
}

/// GET the actor, then validate its outbox collection and first page
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorTest;

impl ActorTest {
    async fn check_outbox(&self, transport: &dyn Transport, outbox_iri: &str) -> bool {
        info!("Dereference Actor outbox");
        let Some(outbox) = dereference(transport, outbox_iri, false, "actor outbox").await else {
            return false;
        };

        info!("Validate outbox type");
        match type_of(&outbox) {
            Some(t) if OUTBOX_TYPES.contains(&t) => {}
            other => {
                error!("Invalid outbox type {:?}", other);
                return false;
            }
        }

        // Items are inline, nothing more to dereference
        if outbox.get("orderedItems").is_some() {
            return true;
        }

        info!("Outbox references pages, dereference first page + validate referenced page type");
        let Some(first) = outbox.get("first").and_then(link_iri) else {
            error!("Outbox {} has neither orderedItems nor first", outbox_iri);
            return false;
        };
        let Some(page) = dereference(transport, first, false, "actor outbox page").await else {
            return false;
        };

        if type_of(&page) != Some(PAGE_TYPE) {
            error!("Invalid type for outbox page {:?}", type_of(&page));
            return false;
        }
        true
    }
}

#[async_trait]
impl TestCase for ActorTest {
    fn name(&self) -> &'static str {
        "ActorTest"
    }

    fn skip(&self, ctx: &TestContext) -> bool {
        skip_unset(ctx.actor_id(), "Actor")
    }

    async fn run(&self, ctx: &TestContext, transport: &dyn Transport) -> bool {
        let Some(actor_id) = ctx.actor_id() else {
            error!("Actor ID not configured");
            return false;
        };

        info!("Dereference Actor");
        let Some(actor) = dereference(transport, actor_id.as_str(), false, "actor").await else {
            return false;
        };

        let Some(outbox) = actor.get("outbox").and_then(link_iri) else {
            error!("Actor {} has no outbox", actor_id);
            return false;
        };
        self.check_outbox(transport, outbox).await
    }
}

/// GET an object under both accepted content negotiations
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectTest;

#[async_trait]
impl TestCase for ObjectTest {
    fn name(&self) -> &'static str {
        "ObjectTest"
    }

    fn skip(&self, ctx: &TestContext) -> bool {
        skip_unset(ctx.object_id(), "Object")
    }

    async fn run(&self, ctx: &TestContext, transport: &dyn Transport) -> bool {
        let Some(object_id) = ctx.object_id() else {
            error!("Object ID not configured");
            return false;
        };

        info!("Dereference object (accept=activity+json)");
        if dereference(transport, object_id.as_str(), false, "object (activity+json)")
            .await
            .is_none()
        {
            return false;
        }

        info!("Dereference object (accept=ld+json, profile specified)");
        dereference(transport, object_id.as_str(), true, "object (ld+json profile)")
            .await
            .is_some()
    }
}

/// A deleted object answers 410 (tombstones) or 404
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletedObject;

#[async_trait]
impl TestCase for DeletedObject {
    fn name(&self) -> &'static str {
        "DeletedObject"
    }

    fn skip(&self, ctx: &TestContext) -> bool {
        skip_unset(ctx.deleted_object_id(), "Deleted Object")
    }

    async fn run(&self, ctx: &TestContext, transport: &dyn Transport) -> bool {
        let Some(iri) = ctx.deleted_object_id() else {
            return false;
        };
        let expected = if ctx.use_tombstone() {
            StatusCode::GONE
        } else {
            StatusCode::NOT_FOUND
        };
        expect_status(transport, iri, expected, "deleted object").await
    }
}

/// An object that never existed answers 404
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidObject;

#[async_trait]
impl TestCase for InvalidObject {
    fn name(&self) -> &'static str {
        "InvalidObject"
    }

    fn skip(&self, ctx: &TestContext) -> bool {
        skip_unset(ctx.invalid_object_id(), "Invalid Object")
    }

    async fn run(&self, ctx: &TestContext, transport: &dyn Transport) -> bool {
        let Some(iri) = ctx.invalid_object_id() else {
            return false;
        };
        expect_status(transport, iri, StatusCode::NOT_FOUND, "invalid object").await
    }
}

/// A private object answers 403 or 404 to an anonymous GET
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivateObject;

#[async_trait]
impl TestCase for PrivateObject {
    fn name(&self) -> &'static str {
        "PrivateObject"
    }

    fn skip(&self, ctx: &TestContext) -> bool {
        skip_unset(ctx.private_object_id(), "Private Object")
    }

    async fn run(&self, ctx: &TestContext, transport: &dyn Transport) -> bool {
        let Some(iri) = ctx.private_object_id() else {
            return false;
        };
        let expected = if ctx.use_forbidden() {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::NOT_FOUND
        };
        expect_status(transport, iri, expected, "private object").await
    }
}
