use serde::{Deserialize, Serialize};

/// A single unit of work submitted to the orchestrator.
///
/// Tasks are immutable once submitted; the orchestrator never mutates them
/// and the handler receives them by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, assigned at creation and never reused
    pub id: String,

    /// Reporting label grouping tasks (a "division"); no scheduling weight
    #[serde(default)]
    pub category: String,

    /// Opaque payload passed through to the execution handler
    #[serde(default)]
    pub payload: serde_json::Value,

    /// Ordering hint: higher priority is dispatched first within a shard
    #[serde(default)]
    pub priority: i32,
}

impl Task {
    pub fn new(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            category: String::new(),
            payload,
            priority: 0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}
