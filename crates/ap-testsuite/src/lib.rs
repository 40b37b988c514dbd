//! # ActivityPub Conformance Test Suite
//!
//! Client-side checks that a federated server publishes actors and objects
//! the way the protocol requires. The suite dereferences a handful of known
//! identifiers with ActivityStreams content negotiation and validates the
//! shapes and status codes that come back.
//!
//! ## Features
//!
//! - **Typed parameters**: a closed set of identifier and flag parameters,
//!   merged from direct arguments and a TOML `test_config` document
//! - **Webfinger discovery**: `user = "name@host"` resolves the actor for you
//! - **Content negotiation**: `application/activity+json` and
//!   `application/ld+json` with the ActivityStreams profile
//! - **Status expectations**: deleted (404/410), invalid (404) and private
//!   (404/403) objects
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ap_testsuite::prelude::*;
//! use std::collections::HashMap;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(&TransportConfig::default())?;
//!
//!     let mut ctx = TestContext::new();
//!     let mut args = HashMap::new();
//!     args.insert(
//!         "actor_id".to_string(),
//!         toml::Value::from("https://social.example/users/alice"),
//!     );
//!     ctx.load_direct(&args)?;
//!
//!     let report = Runner::new()
//!         .fail_fast(true)
//!         .run(&standard_suite(), &ctx, &transport)
//!         .await;
//!     println!("failed: {:?}", report.failed());
//!
//!     Ok(())
//! }
//! ```

pub mod cases;
pub mod config;
pub mod context;
pub mod error;
pub mod identifier;
pub mod prelude;
pub mod runner;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types
pub use cases::{TestCase, standard_suite};
pub use config::TransportConfig;
pub use context::{ParamKind, ParamSource, ParamValue, Parameter, TestContext};
pub use error::{ConfigError, ConfigResult, DereferenceError, TransportError, TransportResult};
pub use identifier::get_id;
pub use runner::{RunReport, Runner, TestEvent};
pub use transport::{Accept, Dereferenced, HttpTransport, Transport};
