//! Descriptor accounting across every way an invocation can end.
//!
//! Each test counts this process's open file descriptors before and after an
//! invocation; pipes left behind by the executor would show up as growth.
//! Tests run serially since any concurrent invocation skews the count.

#![cfg(target_os = "linux")]

use extexec::{ExecError, ProcessExecutor, execute};
use serial_test::serial;
use std::thread;
use std::time::{Duration, Instant};

fn open_fds() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

/// Wait for the descriptor count to drop back to `baseline`.
fn settles_to(baseline: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if open_fds() <= baseline {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
#[serial]
fn success_releases_descriptors() {
    let baseline = open_fds();
    for _ in 0..20 {
        let result = execute(&["cat"], None, Some("payload\n")).unwrap();
        assert_eq!(result.output, "payload\n");
    }
    assert!(settles_to(baseline), "descriptors leaked after successful runs");
}

#[test]
#[serial]
fn nonzero_exit_releases_descriptors() {
    let baseline = open_fds();
    for _ in 0..20 {
        let result = execute(&["sh", "-c", "echo oops >&2; exit 3"], None, None).unwrap();
        assert_eq!(result.exit_code, 3);
    }
    assert!(settles_to(baseline), "descriptors leaked after failing runs");
}

#[test]
#[serial]
fn spawn_failure_releases_descriptors() {
    let baseline = open_fds();
    for _ in 0..20 {
        let err = execute(&["/nonexistent/extexec-tool"], None, Some("x")).unwrap_err();
        assert!(matches!(err, ExecError::Io { .. }));
    }
    assert!(settles_to(baseline), "descriptors leaked after spawn failures");
}

#[test]
#[serial]
fn timeout_releases_descriptors() {
    let baseline = open_fds();
    let err = ProcessExecutor::new()
        .with_timeout(Duration::from_millis(100))
        .execute(&["sleep", "10"], None, None)
        .unwrap_err();
    assert!(matches!(err, ExecError::Timeout { .. }));
    assert!(settles_to(baseline), "descriptors leaked after timeout");
}

#[test]
#[serial]
fn interrupt_releases_descriptors() {
    let baseline = open_fds();
    let executor = ProcessExecutor::new();
    let handle = executor.interrupt_handle();

    let trigger = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        handle.interrupt();
    });
    let result = executor.execute(&["sleep", "10"], None, None).unwrap();
    trigger.join().unwrap();

    assert!(result.interrupted);
    assert!(settles_to(baseline), "descriptors leaked after interrupt");
}
