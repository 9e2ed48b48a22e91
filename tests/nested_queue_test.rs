//! Nested Queue Tests
//!
//! A queue embedded in another queue's batch is one schedulable unit: the
//! outer batch waits for its settlement, its failure fails the outer
//! batch, and cancelling the outer queue recurses into it.

#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use taskqueue::queue::{TaskQueue, WorkItem};

fn scratch(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "taskqueue-nested-{}-{}",
        std::process::id(),
        name
    ));
    let _ = fs::remove_file(&path);
    path
}

#[tokio::test]
async fn test_nested_queue_is_a_single_unit() {
    let log = scratch("single-unit");
    let inner = TaskQueue::new("inner").add_concurrent([
        format!("sleep 0.2 && echo inner-slow >> {}", log.display()),
        format!("echo inner-fast >> {}", log.display()),
    ]);
    let outer = TaskQueue::new("outer").add_sequential([
        WorkItem::from(inner),
        WorkItem::from(format!("echo after >> {}", log.display())),
    ]);

    outer.run().await.expect("everything succeeds");

    let contents = fs::read_to_string(&log).expect("log should exist");
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[2], "after",
        "the outer batch must wait for the nested queue"
    );
    let _ = fs::remove_file(&log);
}

#[tokio::test]
async fn test_nested_failure_fails_the_outer_batch() {
    let marker = scratch("propagate");
    let inner = TaskQueue::new("inner").add_sequential(["exit 1"]);
    let outer = TaskQueue::new("outer").add_sequential([
        WorkItem::from(inner),
        WorkItem::from(format!("touch {}", marker.display())),
    ]);

    outer.run().await.expect_err("nested failure propagates");
    assert!(!marker.exists(), "items after the nested queue never start");
}

#[tokio::test]
async fn test_cancel_recurses_into_nested_queues() {
    let inner = TaskQueue::new("inner").add_concurrent(["sleep 30"]);
    let outer = TaskQueue::new("outer").add_sequential([WorkItem::from(inner.clone())]);

    let running = outer.clone();
    let run = tokio::spawn(async move { running.run().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    outer.cancel();

    run.await.unwrap().expect_err("outer run settles to failure");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(inner.all_terminated(), "the nested command was terminated");
}

#[tokio::test]
async fn test_group_failure_cancels_nested_watchers() {
    let inner = TaskQueue::new("watchers").add_concurrent(["sleep 30", "sleep 30"]);
    let outer = TaskQueue::new("outer").add_group([
        WorkItem::from(inner.clone()),
        WorkItem::from("exit 1"),
    ]);

    let started = Instant::now();
    outer.run().await.expect_err("the failing item settles the group");

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(inner.all_terminated(), "nested watchers were terminated");
}

#[tokio::test]
async fn test_two_levels_of_nesting() {
    let log = scratch("deep");
    let leaf = TaskQueue::new("leaf")
        .add_sequential([format!("echo leaf >> {}", log.display())]);
    let middle = TaskQueue::new("middle").add_sequential([WorkItem::from(leaf)]);
    let outer = TaskQueue::new("outer").add_sequential([
        WorkItem::from(middle),
        WorkItem::from(format!("echo outer >> {}", log.display())),
    ]);

    outer.run().await.expect("the whole tree succeeds");

    let contents = fs::read_to_string(&log).expect("log should exist");
    assert_eq!(contents, "leaf\nouter\n");
    let _ = fs::remove_file(&log);
}
