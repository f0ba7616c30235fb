//! Test listener bridging both reporting shapes
//!
//! A host test framework may register the same [`TestListener`] through its
//! flat callback API and through its hierarchical test-plan API. Start
//! callbacks feed the identity resolver; finish callbacks write the
//! correlation record. Registering through both APIs delivers two "run
//! finished" callbacks for the same run, and only one record is written.

use crate::context::AgentContext;
use crate::correlation::{CorrelationLogWriter, WriteOutcome};
use crate::identity::{Description, TestEvent, TestIdentifier, TestIdentityResolver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Flat per-test callback API
pub trait FlatRunListener {
    /// A test method is about to run
    fn test_started(&self, description: &Description);
    /// All tests have finished
    fn test_run_finished(&self);
}

/// Hierarchical test-plan callback API
pub trait TestExecutionListener {
    /// A node of the test plan (engine, suite or test) is about to run
    fn execution_started(&self, identifier: &TestIdentifier);
    /// The whole test plan has finished
    fn test_plan_execution_finished(&self);
}

/// Serialized lifecycle callback, one per JSON line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LifecycleEvent {
    /// Flat shape: a test method started
    TestStarted { description: Description },
    /// Flat shape: the run finished
    TestRunFinished,
    /// Hierarchical shape: a test plan node started
    ExecutionStarted { identifier: TestIdentifier },
    /// Hierarchical shape: the test plan finished
    TestPlanExecutionFinished,
}

/// Listener implementing both callback APIs for one test process
#[derive(Debug)]
pub struct TestListener {
    ctx: Arc<AgentContext>,
    resolver: TestIdentityResolver,
    writer: CorrelationLogWriter,
}

impl TestListener {
    pub fn new(ctx: Arc<AgentContext>) -> Self {
        info!("Starting per-test listener for dump {}", ctx.dump_id);
        let writer = CorrelationLogWriter::for_context(&ctx);
        Self {
            ctx,
            resolver: TestIdentityResolver::new(),
            writer,
        }
    }

    /// The latched test identity, if any
    pub fn current_identity(&self) -> Option<&str> {
        self.resolver.current_identity()
    }

    /// Whether the correlation record has been written
    pub fn has_written_record(&self) -> bool {
        self.writer.has_written()
    }

    /// Route a serialized lifecycle callback to the matching listener method
    pub fn dispatch(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::TestStarted { description } => self.test_started(description),
            LifecycleEvent::TestRunFinished => self.test_run_finished(),
            LifecycleEvent::ExecutionStarted { identifier } => self.execution_started(identifier),
            LifecycleEvent::TestPlanExecutionFinished => self.test_plan_execution_finished(),
        }
    }

    fn write_lookup_record(&self) -> WriteOutcome {
        self.writer.write_once(&self.ctx.dump_id, self.resolver.current_identity())
    }
}

impl FlatRunListener for TestListener {
    fn test_started(&self, description: &Description) {
        self.resolver.observe(TestEvent::Flat(description));
    }

    fn test_run_finished(&self) {
        self.write_lookup_record();
    }
}

impl TestExecutionListener for TestListener {
    fn execution_started(&self, identifier: &TestIdentifier) {
        if let Some(identity) = self.resolver.observe(TestEvent::Hierarchical(identifier)) {
            info!("Test {} has dump identifier {}", identity, self.ctx.dump_id);
        }
    }

    fn test_plan_execution_finished(&self) {
        self.write_lookup_record();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DumpId;
    use crate::identity::{TestSource, TestType};
    use crate::options::AgentOptions;
    use std::fs;
    use tempfile::TempDir;

    fn listener(dir: &std::path::Path) -> TestListener {
        let options = AgentOptions {
            command: String::new(),
            output_directory: dir.to_path_buf(),
            sync_command: false,
        };
        TestListener::new(Arc::new(AgentContext::with_dump_id(
            &options,
            DumpId::new("12345_1700000000000"),
        )))
    }

    #[test]
    fn test_both_finish_callbacks_write_one_record() {
        let temp = TempDir::new().unwrap();
        let listener = listener(temp.path());

        listener.test_started(&Description::new("pkg.Foo", "works"));
        listener.test_plan_execution_finished();
        listener.test_run_finished();

        let content = fs::read_to_string(temp.path().join("dump-lookup.log")).unwrap();
        assert_eq!(content, "12345_1700000000000;pkg.Foo\n");
        assert!(listener.has_written_record());
    }

    #[test]
    fn test_finish_without_identity_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let listener = listener(temp.path());

        listener.test_run_finished();

        assert!(!temp.path().join("dump-lookup.log").exists());
        assert!(!listener.has_written_record());
    }

    #[test]
    fn test_dispatch_hierarchical_events() {
        let temp = TempDir::new().unwrap();
        let listener = listener(temp.path());

        let events = [
            LifecycleEvent::ExecutionStarted {
                identifier: TestIdentifier {
                    unique_id: "[engine:junit-jupiter]".to_string(),
                    parent_id: None,
                    display_name: "JUnit Jupiter".to_string(),
                    source: None,
                    test_type: TestType::Container,
                },
            },
            LifecycleEvent::ExecutionStarted {
                identifier: TestIdentifier {
                    unique_id: "[engine:junit-jupiter]/[class:pkg.Foo]/[method:a()]".to_string(),
                    parent_id: Some("[engine:junit-jupiter]/[class:pkg.Foo]".to_string()),
                    display_name: "a()".to_string(),
                    source: Some(TestSource::Method {
                        class_name: "pkg.Foo".to_string(),
                        method_name: "a".to_string(),
                    }),
                    test_type: TestType::Test,
                },
            },
            LifecycleEvent::TestPlanExecutionFinished,
        ];
        for event in &events {
            listener.dispatch(event);
        }

        assert_eq!(listener.current_identity(), Some("pkg.Foo"));
        let content = fs::read_to_string(temp.path().join("dump-lookup.log")).unwrap();
        assert_eq!(content, "12345_1700000000000;pkg.Foo\n");
    }

    #[test]
    fn test_lifecycle_event_json() {
        let event: LifecycleEvent = serde_json::from_str(
            r#"{"event":"testStarted","description":{"className":"pkg.Bar","methodName":"x"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            LifecycleEvent::TestStarted {
                description: Description::new("pkg.Bar", "x")
            }
        );

        let event: LifecycleEvent = serde_json::from_str(r#"{"event":"testRunFinished"}"#).unwrap();
        assert_eq!(event, LifecycleEvent::TestRunFinished);

        let event: LifecycleEvent =
            serde_json::from_str(r#"{"event":"testPlanExecutionFinished"}"#).unwrap();
        assert_eq!(event, LifecycleEvent::TestPlanExecutionFinished);
    }
}
