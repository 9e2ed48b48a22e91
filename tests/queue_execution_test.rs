//! Queue Execution Tests
//!
//! End-to-end tests driving real shell commands through the queue:
//! sequential ordering, failure propagation across items and batches, and
//! concurrent aggregation independent of completion order.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use taskqueue::queue::TaskQueue;

/// Path for a per-test scratch file under the system temp directory.
fn scratch(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "taskqueue-exec-{}-{}",
        std::process::id(),
        name
    ));
    let _ = fs::remove_file(&path);
    path
}

fn append(path: &Path, text: &str) -> String {
    format!("echo {} >> {}", text, path.display())
}

#[tokio::test]
async fn test_sequential_commands_run_in_order() {
    let log = scratch("seq-order");
    let queue = TaskQueue::new("seq-order").add_sequential([
        append(&log, "first"),
        append(&log, "second"),
        append(&log, "third"),
    ]);

    queue.run().await.expect("all commands exit zero");

    let contents = fs::read_to_string(&log).expect("log should exist");
    assert_eq!(contents, "first\nsecond\nthird\n");
    let _ = fs::remove_file(&log);
}

#[tokio::test]
async fn test_sequential_failure_skips_remaining_items() {
    let marker = scratch("seq-skip");
    let queue = TaskQueue::new("seq-skip").add_sequential([
        "exit 0".to_string(),
        "exit 1".to_string(),
        format!("touch {}", marker.display()),
    ]);

    queue.run().await.expect_err("second command fails");

    assert!(!marker.exists(), "third command must never start");
}

#[tokio::test]
async fn test_failed_batch_stops_later_batches() {
    let marker = scratch("batch-order");
    let queue = TaskQueue::new("batch-order")
        .add_sequential(["exit 1".to_string()])
        .add_concurrent([format!("touch {}", marker.display())]);

    queue.run().await.expect_err("first batch fails");

    assert!(!marker.exists(), "second batch must never start");
}

#[tokio::test]
async fn test_concurrent_success_is_completion_order_independent() {
    let slow = scratch("conc-slow");
    let fast = scratch("conc-fast");
    // the first item finishes last
    let queue = TaskQueue::new("conc").add_concurrent([
        format!("sleep 0.2 && touch {}", slow.display()),
        format!("touch {}", fast.display()),
    ]);

    queue.run().await.expect("both items succeed");

    assert!(slow.exists());
    assert!(fast.exists());
    let _ = fs::remove_file(&slow);
    let _ = fs::remove_file(&fast);
}

#[tokio::test]
async fn test_concurrent_failure_settles_the_batch() {
    let queue = TaskQueue::new("conc-fail").add_concurrent(["sleep 0.2", "exit 7"]);
    queue.run().await.expect_err("one item fails");
}

#[tokio::test]
async fn test_exit_zero_means_success() {
    let queue = TaskQueue::new("truthy").add_sequential(["true", "exit 0"]);
    queue.run().await.expect("zero exit status is success");
}

#[tokio::test]
async fn test_working_directory_override() {
    use taskqueue::queue::{CommandSpec, WorkItem};

    // compare the basename; some hosts resolve /tmp through a symlink
    let queue = TaskQueue::new("cwd").add_sequential([WorkItem::from(
        CommandSpec::new("test \"$(basename \"$(pwd)\")\" = tmp").current_dir("/tmp"),
    )]);
    queue.run().await.expect("command runs under /tmp");
}
