use serde::{Deserialize, Serialize};

/// Movie counter singleton stored under the metadata collection
///
/// Incremented inside the add transaction, decremented by a separate
/// read-then-write on delete, so it can trail the true collection size
/// under concurrent deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterRecord {
    pub count: i64,
}

impl CounterRecord {
    pub fn new() -> Self {
        Self { count: 0 }
    }
}

impl Default for CounterRecord {
    fn default() -> Self {
        Self::new()
    }
}
