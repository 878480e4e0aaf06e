use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const RUN: &str = r#"running 2 tests
{ "type": "suite", "event": "started", "test_count": 2 }
{ "type": "test", "event": "started", "name": "cart::tests::adds_item" }
{ "type": "test", "event": "started", "name": "cart::tests::rejects_negative" }
{ "type": "test", "name": "cart::tests::adds_item", "event": "ok", "exec_time": 0.002 }
{ "type": "test", "name": "cart::tests::rejects_negative", "event": "failed", "exec_time": 0.004, "stdout": "thread 'cart::tests::rejects_negative' panicked at src/cart.rs:40:9:\nassertion failed: total >= 0\n" }
{ "type": "suite", "event": "failed", "passed": 1, "failed": 1, "ignored": 0, "measured": 0, "filtered_out": 0, "exec_time": 0.01 }
"#;

const PASSING_RUN: &str = r#"{ "type": "suite", "event": "started", "test_count": 1 }
{ "type": "test", "event": "started", "name": "cart::tests::adds_item" }
{ "type": "test", "name": "cart::tests::adds_item", "event": "ok", "exec_time": 0.002 }
{ "type": "suite", "event": "ok", "passed": 1, "failed": 0, "ignored": 0, "measured": 0, "filtered_out": 0, "exec_time": 0.01 }
"#;

// RUN has a failing test, so every upload of it exits with this code.
const TESTS_FAILED: i32 = 1;
const UPLOAD_FAILED: i32 = 3;

fn tesults(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tesults").unwrap();
    cmd.current_dir(dir)
        .env_remove("TESULTS_TARGET")
        .env_remove("TESULTS_FILES")
        .env_remove("TESULTS_CONFIG")
        .env_remove("TESULTS_URL")
        .env("RUST_LOG", "warn");
    cmd
}

fn write_run(dir: &Path) -> std::path::PathBuf {
    let input = dir.join("run.json");
    std::fs::write(&input, RUN).unwrap();
    input
}

fn read_payload(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn version_prints_package_version() {
    let dir = tempfile::tempdir().unwrap();
    tesults(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn without_target_nothing_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_run(dir.path());
    tesults(dir.path())
        .arg("upload")
        .arg(&input)
        .assert()
        .code(TESTS_FAILED)
        .stdout(predicate::str::contains("No test results."));
}

#[test]
fn dry_run_writes_the_payload() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_run(dir.path());
    let out = dir.path().join("payload.json");

    tesults(dir.path())
        .args(["upload", "--tesults-target", "T", "--dry-run", "--output"])
        .arg(&out)
        .args(["--tesults-build-name", "b-9", "--tesults-build-result", "fail"])
        .arg(&input)
        .assert()
        .code(TESTS_FAILED);

    let payload = read_payload(&out);
    assert_eq!(payload["target"], "T");
    let cases = payload["results"]["cases"].as_array().unwrap();
    assert_eq!(cases.len(), 3);

    assert_eq!(cases[0]["name"], "adds_item");
    assert_eq!(cases[0]["suite"], "cart::tests");
    assert_eq!(cases[0]["result"], "pass");
    assert_eq!(cases[0]["reason"], "");

    assert_eq!(cases[1]["name"], "rejects_negative");
    assert_eq!(cases[1]["result"], "fail");
    assert!(cases[1]["reason"]
        .as_str()
        .unwrap()
        .contains("assertion failed: total >= 0"));

    assert_eq!(cases[2]["name"], "b-9");
    assert_eq!(cases[2]["suite"], "[build]");
    assert_eq!(cases[2]["result"], "fail");
}

#[test]
fn stdin_input_and_nosuites() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("payload.json");

    tesults(dir.path())
        .args(["upload", "-", "--tesults-target", "T", "--tesults-nosuites", "--dry-run"])
        .arg("--output")
        .arg(&out)
        .write_stdin(RUN)
        .assert()
        .code(TESTS_FAILED);

    let payload = read_payload(&out);
    let cases = payload["results"]["cases"].as_array().unwrap();
    assert_eq!(cases.len(), 2);
    assert!(cases.iter().all(|c| c.get("suite").is_none()));
}

#[test]
fn target_alias_comes_from_default_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_run(dir.path());
    let out = dir.path().join("payload.json");
    std::fs::write(
        dir.path().join("tesults.toml"),
        "[tesults]\nnightly = \"secret-token\"\n",
    )
    .unwrap();

    tesults(dir.path())
        .args(["upload", "--tesults-target", "nightly", "--dry-run", "--output"])
        .arg(&out)
        .arg(&input)
        .assert()
        .code(TESTS_FAILED);

    assert_eq!(read_payload(&out)["target"], "secret-token");
}

#[test]
fn attachments_are_listed() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_run(dir.path());
    let out = dir.path().join("payload.json");
    let files = dir.path().join("files");
    let case_dir = files.join("cart::tests").join("rejects_negative");
    std::fs::create_dir_all(&case_dir).unwrap();
    std::fs::write(case_dir.join("cart.json"), "{}").unwrap();

    tesults(dir.path())
        .args(["upload", "--tesults-target", "T", "--dry-run"])
        .arg("--tesults-files")
        .arg(&files)
        .arg("--output")
        .arg(&out)
        .arg(&input)
        .assert()
        .code(TESTS_FAILED);

    let payload = read_payload(&out);
    let cases = payload["results"]["cases"].as_array().unwrap();
    assert!(cases[0].get("files").is_none());
    let listed = cases[1]["files"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].as_str().unwrap().ends_with("cart.json"));
}

#[test]
fn unreachable_service_only_changes_exit_code_in_strict_mode() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_run(dir.path());

    tesults(dir.path())
        .args(["upload", "--tesults-target", "T", "--tesults-url", "http://127.0.0.1:9"])
        .arg(&input)
        .assert()
        .code(TESTS_FAILED)
        .stderr(predicate::str::contains("Tesults upload failed"));

    tesults(dir.path())
        .args(["upload", "--strict", "--tesults-target", "T", "--tesults-url", "http://127.0.0.1:9"])
        .arg(&input)
        .assert()
        .code(UPLOAD_FAILED);
}

#[test]
fn exit_code_follows_the_test_run() {
    let dir = tempfile::tempdir().unwrap();

    tesults(dir.path())
        .args(["upload", "-", "--tesults-target", "T", "--dry-run"])
        .write_stdin(PASSING_RUN)
        .assert()
        .success();

    tesults(dir.path())
        .args(["upload", "-", "--tesults-target", "T", "--dry-run"])
        .write_stdin(RUN)
        .assert()
        .code(TESTS_FAILED);

    tesults(dir.path())
        .args(["upload", "-"])
        .write_stdin(RUN)
        .assert()
        .code(TESTS_FAILED)
        .stdout(predicate::str::contains("No test results."));
}

#[test]
fn missing_input_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    tesults(dir.path())
        .args(["upload", "--tesults-target", "T", "does-not-exist.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to open"));
}
