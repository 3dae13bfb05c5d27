//! Integration smoke tests for `exam_scheduler`

use exam_scheduler::get_version;

#[test]
fn version_is_not_empty() {
    let v = get_version();
    assert!(!v.trim().is_empty());
}
