//! End-to-end check of the `status` subcommand with a stub scraper.
//!
//! The scrape command is whatever the config names, so `cat` over a
//! fixture file stands in for the real browser script.

use chrono::{Duration, Utc};
use serde_json::json;
use std::process::Command;

fn write_fixture(dir: &std::path::Path) -> std::path::PathBuf {
    let fresh = Utc::now() - Duration::hours(1);
    let stale = Utc::now() - Duration::days(3);
    let status = json!({
        "last_updated": Utc::now().to_rfc3339(),
        "status": "In progress",
        "language": "Completed",
        "presence": "Not started",
        "test": "Completed",
        "background": "In progress",
        "prohibitions": "Completed",
        "oath": "Not started",
        "history": [
            {
                "date": fresh.to_rfc3339(),
                "title": "Background check",
                "category": "Security",
                "description": "We are processing your background verification."
            },
            {
                "date": stale.to_rfc3339(),
                "title": "Test results",
                "category": "Citizenship test",
                "description": "You passed the citizenship test."
            }
        ]
    });
    let path = dir.join("live_status.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&status).unwrap()).unwrap();
    path
}

#[test]
fn status_subcommand_renders_the_stub_scrape() {
    if which::which("cat").is_err() {
        eprintln!("Skipping: no cat on PATH");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_cstbot"))
        .arg("--state-dir")
        .arg(dir.path())
        .arg("status")
        .env("CSTBOT_SCRAPE_COMMAND", format!("cat {}", fixture.display()))
        .env("CSTBOT_UCI", "test-uci")
        .env("CSTBOT_PASSWORD", "test-password")
        .output()
        .expect("run cstbot");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("Background: In progress"),
        "unexpected summary: {stdout}"
    );
    assert!(stdout.contains("Last updated: "));
    assert!(stdout.contains("We are processing your background verification."));
    assert!(!stdout.contains("You passed the citizenship test."));
}

#[test]
fn status_subcommand_fails_fast_without_a_scrape_command() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_cstbot"))
        .arg("--state-dir")
        .arg(dir.path())
        .arg("status")
        .env_remove("CSTBOT_SCRAPE_COMMAND")
        .output()
        .expect("run cstbot");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no scrape command configured"),
        "unexpected stderr: {stderr}"
    );
}
