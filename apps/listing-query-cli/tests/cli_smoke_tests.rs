//! CLI smoke tests for the listing-query binary
//!
//! These run the real binary against temporary config, field-rule and data
//! files and inspect stdout/stderr.

use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn run_listing_query(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_listing-query"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute listing-query")
}

fn stdout_json(output: &Output) -> JsonValue {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {stdout}"))
}

/// Workspace with a config pinned to the temp dir, field rules and twelve
/// listings (`_id` 1..=12, even ids in India).
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let home = dir.path().join("home");
        std::fs::write(
            dir.path().join("config.yaml"),
            format!(
                "home_dir: \"{}\"\nlogging:\n  default:\n    console_level: warn\n",
                home.to_string_lossy().replace('\\', "/")
            ),
        )
        .expect("Failed to write config file");

        std::fs::write(
            dir.path().join("fields.yaml"),
            r#"
- kind: search
  field: title
- kind: filter
  field: country
  type: string
- kind: range
  name: price
  field: price
"#,
        )
        .expect("Failed to write fields file");

        let rows: Vec<JsonValue> = (1..=12)
            .map(|i| {
                json!({
                    "_id": i,
                    "title": format!("Listing {i}"),
                    "country": if i % 2 == 0 { "India" } else { "Italy" },
                    "price": i * 10,
                })
            })
            .collect();
        std::fs::write(
            dir.path().join("listings.json"),
            serde_json::to_string(&rows).unwrap(),
        )
        .expect("Failed to write data file");

        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        let config = self.path("config.yaml");
        let mut full = vec!["--config", path_str(&config)];
        full.extend_from_slice(args);
        let output = run_listing_query(&full);
        if !output.status.success() {
            eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
        }
        output
    }
}

fn path_str(p: &Path) -> &str {
    p.to_str().expect("temp path is UTF-8")
}

#[test]
fn test_cli_help_command() {
    let output = run_listing_query(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("listing-query"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("compile"), "Should contain 'compile' subcommand");
    assert!(stdout.contains("page"), "Should contain 'page' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_listing_query(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("listing-query"));
    assert!(stdout.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_listing_query(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should report the bad subcommand: {stderr}");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_listing_query(&["-c", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config"), "Should mention config file issue: {stderr}");
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let fx = Fixture::new();
    let config_path = fx.path("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_listing_query(&["--config", path_str(&config_path), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load config"), "{stderr}");
}

#[test]
fn test_cli_check_valid_config() {
    let fx = Fixture::new();
    let output = fx.run(&["check"]);

    assert!(output.status.success(), "Should succeed with valid config");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration OK"), "{stdout}");
    assert!(stdout.contains("max_limit=100"), "{stdout}");
}

#[test]
fn test_cli_print_config() {
    let fx = Fixture::new();
    let output = fx.run(&["--print-config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pagination:"), "{stdout}");
    assert!(stdout.contains("max_limit: 100"), "{stdout}");
}

#[test]
fn test_cli_compile_outputs_filter_and_pipeline() {
    let fx = Fixture::new();
    let fields = fx.path("fields.yaml");
    let output = fx.run(&[
        "compile",
        "--fields",
        path_str(&fields),
        "--query",
        "country=India&price_min=50&sortBy=price&sortOrder=asc&page=2&limit=5",
    ]);

    assert!(output.status.success());
    let out = stdout_json(&output);
    assert_eq!(out["filter"]["country"], "India");
    assert_eq!(out["filter"]["price"], json!({ "$gte": 50 }));
    assert_eq!(out["sort"], json!({ "price": 1 }));
    assert_eq!(out["pagination"], json!({ "page": 2, "limit": 5, "skip": 5 }));
    assert_eq!(out["validation"]["isValid"], true);

    let pipeline = out["pipeline"].as_array().expect("pipeline array");
    assert!(pipeline[0].get("$match").is_some());
    assert_eq!(pipeline[1], json!({ "$sort": { "price": 1 } }));
    assert_eq!(
        pipeline[2]["$facet"]["data"],
        json!([{ "$skip": 5 }, { "$limit": 5 }])
    );
}

#[test]
fn test_cli_compile_reports_invalid_pagination() {
    let fx = Fixture::new();
    let output = fx.run(&["compile", "--query", "page=0&limit=500"]);

    assert!(output.status.success(), "compile only reports validation");
    let out = stdout_json(&output);
    assert_eq!(out["validation"]["isValid"], false);
    assert_eq!(out["validation"]["errors"].as_array().map(Vec::len), Some(2));
    assert_eq!(out["pagination"]["limit"], 100);
}

#[test]
fn test_cli_page_offset_with_links() {
    let fx = Fixture::new();
    let (fields, data) = (fx.path("fields.yaml"), fx.path("listings.json"));
    let output = fx.run(&[
        "page",
        "--fields",
        path_str(&fields),
        "--data",
        path_str(&data),
        "--query",
        "country=India&limit=4&page=2",
        "--base-url",
        "/listings",
    ]);

    assert!(output.status.success());
    let out = stdout_json(&output);
    assert_eq!(out["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(out["pagination"]["totalCount"], 6);
    assert_eq!(out["pagination"]["totalPages"], 2);
    assert_eq!(out["pagination"]["hasNext"], false);
    assert_eq!(
        out["pagination"]["links"]["prev"],
        "/listings?country=India&limit=4&page=1"
    );
}

#[test]
fn test_cli_page_facet_matches_offset_totals() {
    let fx = Fixture::new();
    let (fields, data) = (fx.path("fields.yaml"), fx.path("listings.json"));
    let output = fx.run(&[
        "page",
        "--mode",
        "facet",
        "--fields",
        path_str(&fields),
        "--data",
        path_str(&data),
        "--query",
        "country=Italy&sortBy=price&sortOrder=asc&limit=5",
    ]);

    assert!(output.status.success());
    let out = stdout_json(&output);
    assert_eq!(out["pagination"]["totalCount"], 6);
    assert_eq!(out["pagination"]["totalPages"], 2);
    assert_eq!(out["data"][0]["_id"], 1);
    assert_eq!(out["data"][4]["_id"], 9);
}

#[test]
fn test_cli_page_scroll_descends_by_id() {
    let fx = Fixture::new();
    let data = fx.path("listings.json");
    let output = fx.run(&[
        "page",
        "--mode",
        "scroll",
        "--data",
        path_str(&data),
        "--query",
        "limit=5",
    ]);

    assert!(output.status.success());
    let out = stdout_json(&output);
    let ids: Vec<i64> = out["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![12, 11, 10, 9, 8]);
    assert_eq!(out["hasMore"], true);
    assert_eq!(out["nextCursor"], 8);
}

#[test]
fn test_cli_page_rejects_invalid_pagination() {
    let fx = Fixture::new();
    let data = fx.path("listings.json");
    let output = fx.run(&["page", "--data", path_str(&data), "--query", "page=-3"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Page must be a positive integer"), "{stderr}");
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_listing_query(&["page", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--mode"));
    assert!(stdout.contains("--data"));
}
