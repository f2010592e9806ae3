use std::fmt;

use serde::{Deserialize, Serialize};

// one unit of input text, derived once from a loaded resource and never mutated.

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkItem {
    pub index: usize,
    pub source: String,
    pub text: String
}

impl WorkItem {
    pub fn new(index: usize, source: &str, text: String) -> Self {
        WorkItem {
            index,
            source: source.to_string(),
            text
        }
    }
}

/// A group of consecutive work items sent together in one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub items: Vec<WorkItem>
}

impl Batch {
    pub fn new(index: usize, items: Vec<WorkItem>) -> Self {
        Batch {
            index,
            items
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.items.iter().map(|item| item.text.clone()).collect()
    }
}

/// Failure marker recorded for every item of a batch whose remote call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub batch: usize,
    pub message: String
}

impl Failure {
    pub fn new(batch: usize, message: &str) -> Self {
        Failure {
            batch,
            message: message.to_string()
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FAILED (batch {}): {}", self.batch, self.message)
    }
}

pub type ItemResult<T> = Result<T, Failure>;
