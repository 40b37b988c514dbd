//! # Test Suite Prelude
//!
//! Convenient re-exports of the types needed to load parameters and run the
//! standard suite.
//!
//! ```rust
//! use ap_testsuite::prelude::*;
//! ```

// Parameters and loading
pub use crate::config::TransportConfig;
pub use crate::context::{ParamSource, Parameter, TestContext};
pub use crate::error::{ConfigError, ConfigResult, TransportError, TransportResult};

// Transport
pub use crate::transport::{Dereferenced, HttpTransport, Transport};

// Cases and running
pub use crate::cases::{TestCase, standard_suite};
pub use crate::runner::{RunReport, Runner, TestEvent};
