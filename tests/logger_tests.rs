//! Integration tests for logger behavior.

use exam_scheduler::logger::{set_level, set_level_from_str, Level};
use exam_scheduler::{debug, error, info, warn};

#[test]
fn level_parse_accepts_valid() {
    assert!(set_level_from_str("error"));
    assert!(set_level_from_str("warn"));
    assert!(set_level_from_str("info"));
    assert!(set_level_from_str("debug"));
}

#[test]
fn level_parse_rejects_invalid() {
    assert!(!set_level_from_str("invalid"));
    assert!(!set_level_from_str(""));
}

#[test]
fn logs_do_not_panic() {
    set_level(Level::Debug);
    info!("info integration");
    warn!("warn integration");
    error!("error integration");
    debug!("debug integration");
}

#[test]
fn logs_from_worker_threads_do_not_panic() {
    std::thread::scope(|scope| {
        for worker in 0..4 {
            std::thread::Builder::new()
                .name(format!("{}-{worker}", exam_scheduler::logger::WORKER_THREAD_PREFIX))
                .spawn_scoped(scope, move || warn!("worker {worker} integration"))
                .unwrap();
        }
    });
}

#[cfg(feature = "file-logging")]
#[test]
fn file_logging_creates_parent_directories() {
    use exam_scheduler::logger::{close_file_logging, init_file_logging};
    use tempfile::TempDir;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("examsched.log");
    assert!(init_file_logging(&path));
    error!("file integration");
    close_file_logging();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[ERROR] file integration"));
}
