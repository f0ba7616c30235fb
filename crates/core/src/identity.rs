//! Test identity resolution
//!
//! Test frameworks report test progress in one of two shapes:
//!
//! * **flat**: one start notification per test method carrying a
//!   [`Description`] with the class and method name
//! * **hierarchical**: a tree of [`TestIdentifier`]s (engine, suites, tests),
//!   each with an optional parent and an optional [`TestSource`]
//!
//! Both are reduced to a [`TestNode`], and the declaring class of the first
//! test leaf becomes the identity of the whole test process. Suites are
//! recognized but never latched: their display names are free-form text.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Flat-shape description of a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    /// Fully qualified name of the test class
    pub class_name: String,
    /// Name of the test method, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}

impl Description {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: Some(method_name.into()),
        }
    }
}

/// Where a hierarchical node was declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TestSource {
    /// A test class
    #[serde(rename_all = "camelCase")]
    Class { class_name: String },
    /// A test method within a class
    #[serde(rename_all = "camelCase")]
    Method {
        class_name: String,
        method_name: String,
    },
    /// Any other source (file, package, URI, ...)
    #[serde(other)]
    Other,
}

/// Kind of a hierarchical node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TestType {
    #[default]
    Container,
    Test,
    ContainerAndTest,
}

/// Hierarchical-shape identifier of a node in the test plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestIdentifier {
    pub unique_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TestSource>,
    #[serde(default)]
    pub test_type: TestType,
}

impl TestIdentifier {
    /// Whether this node is an executable test (a leaf)
    pub fn is_test(&self) -> bool {
        matches!(self.test_type, TestType::Test | TestType::ContainerAndTest)
    }
}

/// A lifecycle notification in either reporting shape
#[derive(Debug, Clone, Copy)]
pub enum TestEvent<'a> {
    Flat(&'a Description),
    Hierarchical(&'a TestIdentifier),
}

/// Shape-independent view of a started node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestNode {
    /// A single test, identified by its declaring class
    Leaf { class_name: String },
    /// A class-level suite, identified by its display name
    Container { display_name: String },
    /// Nothing that identifies a test class
    Unknown,
}

impl TestNode {
    /// Adapt a flat-shape description
    pub fn from_description(description: &Description) -> Self {
        if description.class_name.is_empty() {
            return TestNode::Unknown;
        }
        TestNode::Leaf {
            class_name: description.class_name.clone(),
        }
    }

    /// Adapt a hierarchical-shape identifier
    ///
    /// Root nodes (engines) and sourceless nodes are `Unknown`. Containers only
    /// count when declared by a class; tests only when declared by a method,
    /// which excludes dynamic and parameterized leaves.
    pub fn from_identifier(identifier: &TestIdentifier) -> Self {
        if identifier.parent_id.is_none() {
            return TestNode::Unknown;
        }
        let Some(source) = &identifier.source else {
            return TestNode::Unknown;
        };

        match (identifier.is_test(), source) {
            (true, TestSource::Method { class_name, .. }) => TestNode::Leaf {
                class_name: class_name.clone(),
            },
            (false, TestSource::Class { .. }) => TestNode::Container {
                display_name: identifier.display_name.clone(),
            },
            _ => TestNode::Unknown,
        }
    }

    /// Adapt an event of either shape
    pub fn from_event(event: TestEvent<'_>) -> Self {
        match event {
            TestEvent::Flat(description) => Self::from_description(description),
            TestEvent::Hierarchical(identifier) => Self::from_identifier(identifier),
        }
    }

    /// Name carried by this node
    pub fn identity(&self) -> Option<&str> {
        match self {
            TestNode::Leaf { class_name } => Some(class_name),
            TestNode::Container { display_name } => Some(display_name),
            TestNode::Unknown => None,
        }
    }
}

/// Latches the first canonical test identity observed
#[derive(Debug, Default)]
pub struct TestIdentityResolver {
    identity: OnceCell<String>,
}

impl TestIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a start notification
    ///
    /// Returns the identity if this call latched it. Only leaves latch; later
    /// notifications never replace a latched identity and unresolvable ones
    /// are skipped silently.
    pub fn observe(&self, event: TestEvent<'_>) -> Option<&str> {
        if self.identity.get().is_some() {
            return None;
        }

        let node = TestNode::from_event(event);
        let TestNode::Leaf { class_name: candidate } = &node else {
            return None;
        };

        let mut latched = false;
        let identity = self.identity.get_or_init(|| {
            latched = true;
            candidate.to_string()
        });
        if latched {
            debug!("Resolved test identity: {}", identity);
            Some(identity.as_str())
        } else {
            None
        }
    }

    /// The latched identity, or `None` while unresolved
    pub fn current_identity(&self) -> Option<&str> {
        self.identity.get().map(String::as_str)
    }

    pub fn is_resolved(&self) -> bool {
        self.identity.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method_leaf(class_name: &str, parent: Option<&str>) -> TestIdentifier {
        TestIdentifier {
            unique_id: format!("[engine:junit-jupiter]/[class:{}]/[method:works()]", class_name),
            parent_id: parent.map(str::to_string),
            display_name: "works()".to_string(),
            source: Some(TestSource::Method {
                class_name: class_name.to_string(),
                method_name: "works".to_string(),
            }),
            test_type: TestType::Test,
        }
    }

    fn class_container(display_name: &str) -> TestIdentifier {
        TestIdentifier {
            unique_id: format!("[engine:junit-jupiter]/[class:pkg.{}]", display_name),
            parent_id: Some("[engine:junit-jupiter]".to_string()),
            display_name: display_name.to_string(),
            source: Some(TestSource::Class {
                class_name: format!("pkg.{}", display_name),
            }),
            test_type: TestType::Container,
        }
    }

    #[test]
    fn test_hierarchical_leaf_resolves_declaring_class() {
        let resolver = TestIdentityResolver::new();
        let leaf = method_leaf("pkg.Foo", Some("[class:pkg.Foo]"));

        assert_eq!(resolver.observe(TestEvent::Hierarchical(&leaf)), Some("pkg.Foo"));
        assert_eq!(resolver.current_identity(), Some("pkg.Foo"));
    }

    #[test]
    fn test_hierarchical_leaf_without_parent_unresolved() {
        let resolver = TestIdentityResolver::new();
        let leaf = method_leaf("pkg.Foo", None);

        assert_eq!(resolver.observe(TestEvent::Hierarchical(&leaf)), None);
        assert_eq!(resolver.current_identity(), None);
        assert!(!resolver.is_resolved());
    }

    #[test]
    fn test_engine_root_rejected() {
        let engine = TestIdentifier {
            unique_id: "[engine:junit-jupiter]".to_string(),
            parent_id: None,
            display_name: "JUnit Jupiter".to_string(),
            source: None,
            test_type: TestType::Container,
        };
        assert_eq!(TestNode::from_identifier(&engine), TestNode::Unknown);
    }

    #[test]
    fn test_sourceless_node_rejected() {
        let mut leaf = method_leaf("pkg.Foo", Some("parent"));
        leaf.source = None;
        assert_eq!(TestNode::from_identifier(&leaf), TestNode::Unknown);
    }

    #[test]
    fn test_class_container_resolves_display_name() {
        let container = class_container("FooTest");
        assert_eq!(
            TestNode::from_identifier(&container),
            TestNode::Container {
                display_name: "FooTest".to_string()
            }
        );
    }

    #[test]
    fn test_class_container_is_not_latched() {
        let resolver = TestIdentityResolver::new();
        let container = class_container("Foo; the suite");
        let leaf = method_leaf("pkg.FooTest", Some("[class:pkg.FooTest]"));

        assert_eq!(resolver.observe(TestEvent::Hierarchical(&container)), None);
        assert!(!resolver.is_resolved());
        assert_eq!(
            resolver.observe(TestEvent::Hierarchical(&leaf)),
            Some("pkg.FooTest")
        );
        assert_eq!(resolver.current_identity(), Some("pkg.FooTest"));
    }

    #[test]
    fn test_container_without_class_source_rejected() {
        // e.g. a parameterized test template declared by a method
        let mut template = method_leaf("pkg.Foo", Some("parent"));
        template.test_type = TestType::Container;
        assert_eq!(TestNode::from_identifier(&template), TestNode::Unknown);
    }

    #[test]
    fn test_leaf_without_method_source_rejected() {
        let mut dynamic = method_leaf("pkg.Foo", Some("parent"));
        dynamic.source = Some(TestSource::Other);
        assert_eq!(TestNode::from_identifier(&dynamic), TestNode::Unknown);

        let mut class_leaf = method_leaf("pkg.Foo", Some("parent"));
        class_leaf.source = Some(TestSource::Class {
            class_name: "pkg.Foo".to_string(),
        });
        assert_eq!(TestNode::from_identifier(&class_leaf), TestNode::Unknown);
    }

    #[test]
    fn test_container_and_test_counts_as_leaf() {
        let mut node = method_leaf("pkg.Baz", Some("parent"));
        node.test_type = TestType::ContainerAndTest;
        assert_eq!(
            TestNode::from_identifier(&node),
            TestNode::Leaf {
                class_name: "pkg.Baz".to_string()
            }
        );
    }

    #[test]
    fn test_flat_first_start_latches() {
        let resolver = TestIdentityResolver::new();
        let bar = Description::new("pkg.Bar", "first");
        let qux = Description::new("pkg.Qux", "second");

        assert_eq!(resolver.observe(TestEvent::Flat(&bar)), Some("pkg.Bar"));
        assert_eq!(resolver.observe(TestEvent::Flat(&qux)), None);
        assert_eq!(resolver.current_identity(), Some("pkg.Bar"));
    }

    #[test]
    fn test_first_shape_wins() {
        let resolver = TestIdentityResolver::new();
        let leaf = method_leaf("pkg.Foo", Some("parent"));
        let flat = Description::new("pkg.Bar", "test");

        resolver.observe(TestEvent::Hierarchical(&leaf));
        resolver.observe(TestEvent::Flat(&flat));
        assert_eq!(resolver.current_identity(), Some("pkg.Foo"));
    }

    #[test]
    fn test_empty_flat_class_name_unresolved() {
        let resolver = TestIdentityResolver::new();
        let empty = Description::new("", "test");
        assert_eq!(resolver.observe(TestEvent::Flat(&empty)), None);
        assert!(!resolver.is_resolved());
    }

    #[test]
    fn test_identifier_json_shape() {
        let json = r#"{
            "uniqueId": "[engine:junit-jupiter]/[class:pkg.Foo]/[method:works()]",
            "parentId": "[engine:junit-jupiter]/[class:pkg.Foo]",
            "displayName": "works()",
            "source": {"type": "method", "className": "pkg.Foo", "methodName": "works"},
            "testType": "test"
        }"#;
        let identifier: TestIdentifier = serde_json::from_str(json).unwrap();
        assert!(identifier.is_test());
        assert_eq!(
            TestNode::from_identifier(&identifier).identity(),
            Some("pkg.Foo")
        );
    }

    #[test]
    fn test_unknown_source_type_deserializes_as_other() {
        let json = r#"{"type": "file", "path": "tests/foo.rs"}"#;
        let source: TestSource = serde_json::from_str(json).unwrap();
        assert_eq!(source, TestSource::Other);
    }
}
