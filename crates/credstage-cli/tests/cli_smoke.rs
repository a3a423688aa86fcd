use assert_cmd::Command;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use tempfile::TempDir;

fn cli_cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("credstage").expect("binary built");
    cmd.current_dir(tmp.path());
    cmd
}

fn b64(payload: &str) -> String {
    STANDARD.encode(payload)
}

#[test]
fn help_works() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("credential file"));
}

#[test]
fn materializes_firebase_service_account() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .env("FIREBASE_CONFIG_STRING", b64(r#"{"type":"service_account"}"#))
        .args([
            "FIREBASE_CONFIG_STRING",
            "config/firebase_service_account.json",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("FIREBASE_CONFIG_STRING"));

    let written = fs::read_to_string(
        tmp.path().join("config/firebase_service_account.json"),
    )
    .unwrap();
    assert_eq!(written, r#"{"type":"service_account"}"#);
}

#[test]
fn defaults_to_output_json_in_working_directory() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .env("SECRET", b64("{}"))
        .arg("SECRET")
        .assert()
        .success();
    assert_eq!(fs::read_to_string(tmp.path().join("output.json")).unwrap(), "{}");
}

#[test]
fn omitted_variable_name_prints_usage_and_exits_one() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .assert()
        .failure()
        .code(1)
        .stderr(predicates::str::contains("Usage"));
    assert!(!tmp.path().join("output.json").exists());
}

#[test]
fn unset_variable_exits_one_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .env_remove("CREDSTAGE_ABSENT_SECRET")
        .args(["CREDSTAGE_ABSENT_SECRET", "creds.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicates::str::contains("CREDSTAGE_ABSENT_SECRET"));
    assert!(!tmp.path().join("creds.json").exists());
}

#[test]
fn non_json_payload_exits_one_and_removes_file() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .env("SECRET", b64("not-json"))
        .args(["SECRET", "creds.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicates::str::contains("JSON"));
    assert!(!tmp.path().join("creds.json").exists());
}

#[test]
fn skip_validation_accepts_non_json_payloads() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .env("SECRET", b64("not-json"))
        .args(["SECRET", "token.txt", "--skip-validation"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(tmp.path().join("token.txt")).unwrap(),
        "not-json"
    );
}

#[test]
fn json_report_is_machine_readable() {
    let tmp = TempDir::new().unwrap();
    let output = cli_cmd(&tmp)
        .env("SECRET", b64("{}"))
        .args(["SECRET", "creds.json", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["variable"], "SECRET");
    assert_eq!(report["bytes_written"], 2);
}

#[cfg(unix)]
#[test]
fn hand_off_propagates_child_exit_status() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .env("SECRET", b64("{}"))
        .args(["SECRET", "creds.json", "--", "sh", "-c", "exit 7"])
        .assert()
        .code(7);
}

#[cfg(unix)]
#[test]
fn hand_off_runs_after_successful_materialization() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .env("SECRET", b64(r#"{"type":"service_account"}"#))
        .args(["SECRET", "creds.json", "--", "sh", "-c", "test -s creds.json"])
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn hand_off_is_skipped_when_the_gate_fails() {
    let tmp = TempDir::new().unwrap();
    cli_cmd(&tmp)
        .env("SECRET", b64("not-json"))
        .args(["SECRET", "creds.json", "--", "sh", "-c", "touch launched"])
        .assert()
        .failure()
        .code(1);
    assert!(!tmp.path().join("launched").exists());
}
