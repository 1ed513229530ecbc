//! Integration tests for channel routing, rotation and the audit trail.

mod common;

use alcis::domain::models::audit::AuditFields;
use alcis::infrastructure::logging::{ChannelConfig, RouterConfig};
use alcis::{AuditEmitter, ChannelLogRouter};
use common::{read_lines, temp_project};
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;
use tracing::Level;

fn router_in(dir: &std::path::Path) -> Arc<ChannelLogRouter> {
    Arc::new(ChannelLogRouter::new(RouterConfig::new(dir.join("logs"))).unwrap())
}

#[test]
fn test_default_channels_write_to_their_own_files() {
    let project = temp_project();
    let router = router_in(project.path());
    let logs = project.path().join("logs");

    router.resolve("main").info("service started");
    router.resolve("auth").info("login ok");
    router.resolve("ai").info("decision made");
    router.resolve("error").error("boom");

    assert_eq!(read_lines(&logs.join("alcis.log")).len(), 1);
    assert_eq!(read_lines(&logs.join("auth.log")).len(), 1);
    assert_eq!(read_lines(&logs.join("ai_decisions.log")).len(), 1);

    let errors = read_lines(&logs.join("errors.log"));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].ends_with(" - error - ERROR - boom"));
}

#[test]
fn test_security_channel_drops_below_warning() {
    let project = temp_project();
    let router = router_in(project.path());
    let security = router.resolve("security");

    security.info("routine");
    security.warn("suspicious");
    security.error("breach");

    let lines = read_lines(&project.path().join("logs/security.log"));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" - security - WARNING - suspicious"));
    assert!(lines[1].ends_with(" - security - ERROR - breach"));
}

#[test]
fn test_unknown_channel_gets_a_file_on_first_use() {
    let project = temp_project();
    let router = router_in(project.path());

    let first = router.resolve("crawler.linkedin");
    let second = router.resolve("crawler.linkedin");
    first.info("page fetched");

    assert!(Arc::ptr_eq(&first, &second));
    let lines = read_lines(&project.path().join("logs/crawler_linkedin.log"));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(" - crawler.linkedin - INFO - page fetched"));
}

#[test]
fn test_configured_channel_rotates() {
    let project = temp_project();
    let router = router_in(project.path());
    let path = project.path().join("logs/bulk.log");

    router.configure(
        "bulk",
        ChannelConfig::new(path.clone(), Level::DEBUG).with_rotation(256, 2),
    );
    let bulk = router.resolve("bulk");
    for i in 0..40 {
        bulk.debug(&format!("record number {i:03} with some padding text"));
    }

    assert!(path.exists());
    assert!(project.path().join("logs/bulk.log.1").exists());
    assert!(project.path().join("logs/bulk.log.2").exists());
    assert!(!project.path().join("logs/bulk.log.3").exists());
}

#[test]
fn test_audit_trail_end_to_end() {
    let project = temp_project();
    let router = router_in(project.path());
    let audit = AuditEmitter::new(&router);

    audit.record_auth_attempt("linkedin", "alice", false, Some("10.0.0.1"), None, AuditFields::new());
    audit.record_policy_decision("post_comment", "deny", 0.92, AuditFields::new(), AuditFields::new());
    audit.record_security_event("intrusion", "critical", "unexpected admin login", AuditFields::new());
    audit.record_data_access("profiles/42", "read", "bob", true, AuditFields::new());

    let records: Vec<Value> = read_lines(&project.path().join("logs/security_audit.jsonl"))
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let events: Vec<&str> = records.iter().map(|r| r["event"].as_str().unwrap()).collect();
    assert_eq!(
        events,
        vec!["authentication_attempt", "policy_decision", "security_event", "data_access"]
    );
    assert_eq!(records[0]["ip_address"], json!("10.0.0.1"));
    assert_eq!(records[1]["confidence"], json!(0.92));
    assert_eq!(records[2]["level"], "critical");

    let security = read_lines(&project.path().join("logs/security.log"));
    assert_eq!(security.len(), 1, "only the critical record passes the WARN floor");
    assert!(security[0].contains(" - security - ERROR - "));
    assert!(security[0].contains("\"event\":\"security_event\""));
}

#[test]
fn test_concurrent_writers_keep_lines_whole() {
    let project = temp_project();
    let router = router_in(project.path());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                let channel = router.resolve("worker");
                for i in 0..25 {
                    channel.info(&format!("thread {t} line {i}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let lines = read_lines(&project.path().join("logs/worker.log"));
    assert_eq!(lines.len(), 200);
    assert!(lines.iter().all(|line| line.contains(" - worker - INFO - thread ")));
}
