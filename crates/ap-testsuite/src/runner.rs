//! Sequential test runner

use std::fmt;
use tracing::{error, info};

use crate::cases::TestCase;
use crate::context::TestContext;
use crate::transport::Transport;

/// Lifecycle event recorded for a test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestEvent {
    Skipped,
    Running,
    Passed,
    Failed,
}

impl fmt::Display for TestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestEvent::Skipped => write!(f, "skipped"),
            TestEvent::Running => write!(f, "running"),
            TestEvent::Passed => write!(f, "passed"),
            TestEvent::Failed => write!(f, "failed"),
        }
    }
}

/// Everything that happened during one run, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    events: Vec<(&'static str, TestEvent)>,
    aborted_by: Option<&'static str>,
}

impl RunReport {
    fn record(&mut self, name: &'static str, event: TestEvent) {
        match event {
            TestEvent::Failed => error!("Test {} {}", name, event),
            _ => info!("Test {} {}", name, event),
        }
        self.events.push((name, event));
    }

    pub fn events(&self) -> &[(&'static str, TestEvent)] {
        &self.events
    }

    /// Events recorded for one test
    pub fn events_for(&self, name: &str) -> Vec<TestEvent> {
        self.events
            .iter()
            .filter(|(test, _)| *test == name)
            .map(|(_, event)| *event)
            .collect()
    }

    fn with_final(&self, wanted: TestEvent) -> Vec<&'static str> {
        self.events
            .iter()
            .filter(|(_, event)| *event == wanted)
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn passed(&self) -> Vec<&'static str> {
        self.with_final(TestEvent::Passed)
    }

    pub fn failed(&self) -> Vec<&'static str> {
        self.with_final(TestEvent::Failed)
    }

    pub fn skipped(&self) -> Vec<&'static str> {
        self.with_final(TestEvent::Skipped)
    }

    /// The test whose failure stopped a fail-fast run
    pub fn aborted_by(&self) -> Option<&'static str> {
        self.aborted_by
    }

    /// False only when a fail-fast run was cut short.
    ///
    /// Individual failures in a complete run are reported through
    /// [`failed`](Self::failed).
    pub fn success(&self) -> bool {
        self.aborted_by.is_none()
    }
}

/// Runs test cases one at a time in list order
#[derive(Debug, Clone, Copy, Default)]
pub struct Runner {
    fail_fast: bool,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop at the first failing test
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub async fn run(
        &self,
        tests: &[Box<dyn TestCase>],
        ctx: &TestContext,
        transport: &dyn Transport,
    ) -> RunReport {
        let mut report = RunReport::default();

        for test in tests {
            let name = test.name();
            if test.skip(ctx) {
                report.record(name, TestEvent::Skipped);
                continue;
            }

            report.record(name, TestEvent::Running);
            if test.run(ctx, transport).await {
                report.record(name, TestEvent::Passed);
            } else {
                report.record(name, TestEvent::Failed);
                if self.fail_fast {
                    error!("Stopping after {} (fail-fast)", name);
                    report.aborted_by = Some(name);
                    break;
                }
            }
        }

        report
    }
}
