//! End-to-end tests for the kinbox CLI.
//!
//! Tests invoke the `kinbox` binary as a subprocess and verify its output.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn kinbox_in(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kinbox"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    kinbox_in(dir).args(args).output().unwrap()
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run(dir, args);
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    serde_json::from_str(&run_ok(dir, args)).unwrap()
}

fn run_with_stdin(dir: &Path, args: &[&str], input: &str) -> Output {
    let mut child = kinbox_in(dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

const WEBINAR: &str = "/add https://example.com/webinar\n\
    Name: Market research\n\
    Theme: Product\n\
    Sphere: PM\n\
    Type: Webinar\n\
    Duration: 90";

// === Init ===

#[test]
fn e2e_init_creates_database() {
    let dir = TempDir::new().unwrap();
    let stdout = run_ok(dir.path(), &["init"]);
    assert!(stdout.contains("Initialized kinbox database"));
    assert!(dir.path().join("kinbox.db").exists());
}

#[test]
fn e2e_db_flag_overrides_location() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("nested.db");
    run_ok(dir.path(), &["--db", db.to_str().unwrap(), "init"]);
    assert!(db.exists());
    assert!(!dir.path().join("kinbox.db").exists());
}

// === Parse ===

#[test]
fn e2e_parse_prints_record() {
    let dir = TempDir::new().unwrap();
    let record = run_json(dir.path(), &["parse", WEBINAR]);
    assert_eq!(record["link"], "https://example.com/webinar");
    assert_eq!(record["name"], "Market research");
    assert_eq!(record["theme"], "Product");
    assert_eq!(record["sphere"], "PM");
    assert_eq!(record["type"], "Webinar");
    assert_eq!(record["duration"], 90);
    assert_eq!(record["word_count"], 0);
    // Parsing alone never creates a database.
    assert!(!dir.path().join("kinbox.db").exists());
}

#[test]
fn e2e_parse_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let output = run_with_stdin(dir.path(), &["parse"], "Название: Статья\nСлов: 1500\n");
    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["name"], "Статья");
    assert_eq!(record["word_count"], 1500);
}

#[test]
fn e2e_parse_failure_is_localized() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &["parse", "Duration: ninety"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Duration must be a whole number of minutes."));

    let output = run(dir.path(), &["parse", "--locale", "ru", "Link: a b"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Ссылка не должна содержать пробелов."));
}

// === Add / List / Search / Toggle ===

#[test]
fn e2e_add_list_search_toggle() {
    let dir = TempDir::new().unwrap();

    let added = run_json(dir.path(), &["add", "--user", "42", WEBINAR]);
    let id = added["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("knw-"));
    assert_eq!(added["is_read"], false);
    assert_eq!(added["duration"], 90);

    run_json(
        dir.path(),
        &["add", "--user", "7", "https://example.com/other\nName: Rust book"],
    );

    let all = run_json(dir.path(), &["list", "--format", "json"]);
    assert_eq!(all["total"], 2);

    let mine = run_json(dir.path(), &["list", "--user", "42", "--format", "json"]);
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["items"][0]["id"], id.as_str());

    let found = run_json(dir.path(), &["search", "market", "--format", "json"]);
    assert_eq!(found["total"], 1);
    assert_eq!(found["items"][0]["name"], "Market research");

    let toggled = run_json(dir.path(), &["toggle", &id]);
    assert_eq!(toggled["is_read"], true);

    let unread = run_json(dir.path(), &["list", "--unread", "--format", "json"]);
    assert_eq!(unread["total"], 1);
    assert_eq!(unread["items"][0]["name"], "Rust book");

    let toggled = run_json(dir.path(), &["toggle", &id]);
    assert_eq!(toggled["is_read"], false);
}

#[test]
fn e2e_add_rejects_invalid_message() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["add", "Words: many"]);
    assert_eq!(output.status.code(), Some(2));

    let all = run_json(dir.path(), &["list", "--format", "json"]);
    assert_eq!(all["total"], 0);
}

#[test]
fn e2e_toggle_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["init"]);
    let output = run(dir.path(), &["toggle", "knw-missing"]);
    assert!(!output.status.success());
}

#[test]
fn e2e_list_table_and_markdown() {
    let dir = TempDir::new().unwrap();
    assert!(run_ok(dir.path(), &["list"]).contains("(no results)"));

    run_ok(dir.path(), &["add", WEBINAR]);
    let table = run_ok(dir.path(), &["list"]);
    assert!(table.starts_with("id"));
    assert!(table.contains("Market research"));

    let markdown = run_ok(dir.path(), &["list", "--format", "markdown"]);
    assert!(markdown.starts_with("| id |"));
}

// === Config ===

#[test]
fn e2e_config_file_changes_labels_and_command() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("kinbox.toml"),
        "command = \"/save\"\n\n[labels]\nname = [\"Title\"]\n",
    )
    .unwrap();

    let record = run_json(dir.path(), &["parse", "/save Title: Notes"]);
    assert_eq!(record["name"], "Notes");
}

#[test]
fn e2e_file_logging_when_not_local() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("kinbox.toml"),
        "local = false\nlog_file = \"logs/k.txt\"\n",
    )
    .unwrap();

    let output = run(dir.path(), &["add", WEBINAR]);
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("added knowledge"));

    let log = dir.path().join("logs").join("k.txt");
    assert!(log.exists());
    let first = std::fs::read_to_string(&log).unwrap();
    assert!(first.contains("added knowledge"), "{first}");
    assert!(!first.contains('\u{1b}'), "file logs carry no ANSI colors");

    // A second run appends.
    run_ok(dir.path(), &["add", WEBINAR]);
    let second = std::fs::read_to_string(&log).unwrap();
    assert!(second.starts_with(&first));
    assert_eq!(second.matches("added knowledge").count(), 2);
}

#[test]
fn e2e_serve_uses_configured_command() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("kinbox.toml"), "command = \"/save\"\n").unwrap();

    let input = r#"{"user": {"id": 5, "language": "en"}, "text": "/save Name: Notes"}"#;
    let output = run_with_stdin(dir.path(), &["serve"], input);
    assert!(output.status.success());
    let reply: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(reply["text"].as_str().unwrap().starts_with("Added!"));

    let stored = run_json(dir.path(), &["list", "--user", "5", "--format", "json"]);
    assert_eq!(stored["total"], 1);
    assert_eq!(stored["items"][0]["name"], "Notes");
}

// === Serve ===

#[test]
fn e2e_serve_answers_json_lines() {
    let dir = TempDir::new().unwrap();
    let input = [
        r#"{"user": {"id": 42, "language": "en"}, "text": "/start"}"#,
        "not json",
        r#"{"user": {"id": 42, "language": "ru"}, "text": "https://example.com/a\nName: Talk"}"#,
        r#"{"user": {"id": 42}, "text": "/unknown"}"#,
        r#"{"user": {"id": 42, "language": "en"}, "text": "/list"}"#,
    ]
    .join("\n");

    let output = run_with_stdin(dir.path(), &["serve"], &input);
    assert!(
        output.status.success(),
        "serve failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let replies: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["chat_id"], 42);
    assert_eq!(replies[0]["text"], "Hello, human");
    assert!(replies[1]["text"]
        .as_str()
        .unwrap()
        .starts_with("Успешно добавлено!"));
    assert!(replies[2]["text"].as_str().unwrap().contains("Talk"));

    let stored = run_json(dir.path(), &["list", "--user", "42", "--format", "json"]);
    assert_eq!(stored["total"], 1);
}

// === Completions ===

#[test]
fn e2e_completions_need_no_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("kinbox.toml"), "not = [valid").unwrap();
    let stdout = run_ok(dir.path(), &["completions", "bash"]);
    assert!(stdout.contains("kinbox"));
}
