use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

struct CliTestEnv {
    temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            temp_dir,
            home,
            xdg_config,
            xdg_state,
        }
    }

    fn write_config(&self, content: &str) {
        let dir = self.xdg_config.join("pagetrail");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), content).expect("failed to write config");
    }
}

impl CliTestEnv {
    fn write_scenario(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content).expect("failed to write scenario");
        path
    }

    fn log_contents(&self) -> String {
        let dir = self.xdg_state.join("pagetrail");
        let mut contents = String::new();
        for entry in fs::read_dir(&dir).expect("log directory missing") {
            let path = entry.expect("failed to read log entry").path();
            contents.push_str(&fs::read_to_string(path).expect("failed to read log file"));
        }
        contents
    }
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("pagetrail"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute pagetrail: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "pagetrail {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn status_reports_missing_endpoint() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["status"]);
    assert_success(&["status"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pagetrail Tracker Configuration"));
    assert!(stdout.contains("Endpoint:        <not set>"));
    assert!(stdout.contains("Status: Not ready"));
}

#[test]
fn status_reads_config_file() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[tracker]
endpoint = "https://collector.example/e"
trackForms = false
"#,
    );

    let output = run_bin(&env, &["status"]);
    assert_success(&["status"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Endpoint:        https://collector.example/e"));
    assert!(stdout.contains("Track forms:     false"));
    assert!(stdout.contains("Track clicks:    true"));
    assert!(stdout.contains("Status: Ready to collect"));
}

#[test]
fn dry_run_replay_prints_one_record_per_event() {
    let env = CliTestEnv::new();
    let scenario = fixture_path("landing-page.json");
    let scenario = scenario.to_str().expect("fixture path is not UTF-8");
    let args = ["replay", scenario, "--dry-run"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let records: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line is not JSON"))
        .collect();

    let types: Vec<&str> = records
        .iter()
        .map(|r| r["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(
        types,
        vec![
            "pageview",
            "scroll_view",
            "scroll_view",
            "click",
            "form_submit",
            "page_visibility",
            "custom_signup",
            "scroll_view",
        ],
        "unexpected record sequence:\n{stdout}"
    );

    assert_eq!(records[0]["event_target"], "/landing");
    assert_eq!(records[0]["load_time"], 350);
    assert_eq!(records[0]["referrer"], "https://mail.example/inbox");
    assert_eq!(records[1]["section_id"], "hero");
    assert_eq!(records[2]["section_id"], "features");
    assert_eq!(records[3]["event_target"], "#buy");
    assert_eq!(records[4]["form_values"]["email"], "visitor@mail.example");
    assert_eq!(records[6]["plan"], "pro");
    assert_eq!(records[7]["section_id"], "pricing");
    assert_eq!(records[7]["section_title"], "Untitled");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Replayed 9 step(s)"));
    assert!(stderr.contains("Sections:   features, hero, pricing"));
}

#[test]
fn replay_without_endpoint_fails() {
    let env = CliTestEnv::new();
    let scenario = fixture_path("landing-page.json");
    let scenario = scenario.to_str().expect("fixture path is not UTF-8");

    let output = run_bin(&env, &["replay", scenario]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tracker.endpoint is required"));
}

#[test]
fn debug_scenario_writes_record_tables_to_log() {
    let env = CliTestEnv::new();
    let scenario = env.write_scenario(
        "debug.json",
        r#"{
            "environment": { "href": "https://shop.example/", "viewport": [1280, 800] },
            "options": { "debug": true, "initialCheckMs": 10 },
            "steps": [ { "track": { "name": "debugged" } } ]
        }"#,
    );
    let scenario = scenario.to_str().expect("scenario path is not UTF-8");
    let args = ["replay", scenario, "--dry-run"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let log = env.log_contents();
    assert!(log.contains("Event sent"), "log:\n{log}");
    let table_rows = log
        .lines()
        .filter(|line| line.starts_with("event_type") && line.contains(" | "))
        .count();
    assert_eq!(table_rows, 2, "log:\n{log}");
    assert!(log.contains("| custom_debugged"));
}

#[test]
fn replay_reports_sections_visible_at_load() {
    let env = CliTestEnv::new();
    let scenario = env.write_scenario(
        "above-the-fold.json",
        r#"{
            "environment": { "href": "https://shop.example/", "viewport": [1280, 800] },
            "sections": [ { "id": "hero", "heading": "Welcome", "offset": 0, "height": 700 } ],
            "steps": [ { "track": { "name": "x" } } ]
        }"#,
    );
    let scenario = scenario.to_str().expect("scenario path is not UTF-8");
    let args = ["replay", scenario, "--dry-run"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let types: Vec<String> = stdout
        .lines()
        .map(|line| {
            let record: Value = serde_json::from_str(line).expect("stdout line is not JSON");
            record["event_type"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(types, vec!["pageview", "custom_x", "scroll_view"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Sections:   hero"));
}
