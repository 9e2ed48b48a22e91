//! Batches: ordered work items sharing one execution discipline

use serde::{Deserialize, Serialize};

use crate::queue::WorkItem;

/// Concurrency and failure-propagation policy for one batch.
///
/// The discipline is fixed when the batch is appended and governs every item
/// in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discipline {
    /// Items execute one at a time, in order; the first failure stops the
    /// batch and later items never start.
    Sequential,
    /// All items start immediately and run to completion independently; the
    /// first failure settles the batch but siblings are left running.
    Concurrent,
    /// All items start immediately; the first failure terminates every
    /// still-running sibling, recursively through nested queues.
    ConcurrentCancelOnFailure,
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discipline::Sequential => write!(f, "sequential"),
            Discipline::Concurrent => write!(f, "concurrent"),
            Discipline::ConcurrentCancelOnFailure => write!(f, "concurrent-cancel-on-failure"),
        }
    }
}

/// One ordered set of work items sharing an execution discipline.
///
/// Owned exclusively by the queue that created it; items are immutable once
/// the batch is appended.
#[derive(Debug, Clone)]
pub struct Batch {
    discipline: Discipline,
    items: Vec<WorkItem>,
}

impl Batch {
    /// Create a batch with the given discipline and items.
    pub fn new(discipline: Discipline, items: Vec<WorkItem>) -> Self {
        Self { discipline, items }
    }

    /// The discipline governing this batch.
    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// The items in append order.
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// Number of items in the batch.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_keeps_append_order() {
        let batch = Batch::new(
            Discipline::Sequential,
            vec!["first".into(), "second".into(), "third".into()],
        );

        assert_eq!(batch.discipline(), Discipline::Sequential);
        assert_eq!(batch.len(), 3);
        let lines: Vec<_> = batch
            .items()
            .iter()
            .map(|item| match item {
                WorkItem::Command(spec) => spec.line().to_string(),
                WorkItem::SubQueue(queue) => queue.name().to_string(),
            })
            .collect();
        assert_eq!(lines, ["first", "second", "third"]);
    }

    #[test]
    fn test_discipline_display() {
        assert_eq!(Discipline::Sequential.to_string(), "sequential");
        assert_eq!(
            Discipline::ConcurrentCancelOnFailure.to_string(),
            "concurrent-cancel-on-failure"
        );
    }
}
