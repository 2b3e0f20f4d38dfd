#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

fn submit(db_path: &std::path::Path) -> serde_json::Value {
    let output = Command::new(cargo_bin!("mortgage-engine"))
        .args([
            "submit",
            "--catalog",
            "tests/fixtures/catalog.csv",
            "--user",
            "7",
            "--bank",
            "2",
            "--rate-id",
            "2",
            "--price",
            "4000000",
            "--down-payment",
            "1000000",
            "--name",
            "Lee Siu Ming",
            "--phone",
            "5550199",
            "--email",
            "lee@example.com",
            "--income",
            "90000",
            "--db-path",
        ])
        .arg(db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_applications_survive_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. Two separate runs each submit one application
    let first = submit(&db_path);
    let second = submit(&db_path);
    assert_ne!(first["number"], second["number"]);

    // 2. A third run sees both
    let output = Command::new(cargo_bin!("mortgage-engine"))
        .args(["applications", "--user", "7", "--db-path"])
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing["total"], 2);
}

#[test]
fn test_review_persists_status_change() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let submitted = submit(&db_path);
    let number = submitted["number"].as_str().unwrap().to_string();

    let approve = Command::new(cargo_bin!("mortgage-engine"))
        .args(["review", "--number", &number, "--action", "approve", "--db-path"])
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(approve.status.success());

    // Approved applications cannot be approved again after a restart
    let again = Command::new(cargo_bin!("mortgage-engine"))
        .args(["review", "--number", &number, "--action", "approve", "--db-path"])
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(!again.status.success());

    let listing = Command::new(cargo_bin!("mortgage-engine"))
        .args(["applications", "--user", "7", "--status", "approved", "--db-path"])
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    let listing: serde_json::Value = serde_json::from_slice(&listing.stdout).unwrap();
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["number"], number.as_str());
}
