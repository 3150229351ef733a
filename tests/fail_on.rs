use std::path::Path;
use std::process::{Command, Output};

const PATCH: &str = "\
diff --git a/src/Main.go b/src/Main.go
--- a/src/Main.go
+++ b/src/Main.go
@@ -1,5 +1,5 @@
 package main
-old
+new
 func main() {
 }
";

fn write_inputs(dir: &Path, findings: &str) {
    std::fs::write(dir.join("c.patch"), PATCH).unwrap();
    std::fs::write(dir.join("findings.json"), findings).unwrap();
}

fn dry_run(dir: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_diffnote"))
        .args(["annotate", "--findings", "findings.json", "--diff-file", "c.patch"])
        .args(extra)
        .current_dir(dir)
        .env_remove("DIFFNOTE_LOG")
        .output()
        .unwrap()
}

#[test]
fn fail_on_exits_zero_when_no_matching_severity() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        r#"[{"message": "M1", "severity": "major", "filePath": "/repo/src/Main.go", "line": 2}]"#,
    );

    let output = dry_run(dir.path(), &["--fail-on", "critical"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn fail_on_exits_one_when_matching_severity_found() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        r#"[{"message": "B1", "severity": "blocker", "filePath": "/repo/src/Main.go", "line": 2}]"#,
    );

    let output = dry_run(dir.path(), &["--fail-on", "critical"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn fail_on_ignores_findings_outside_the_diff() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        r#"[{"message": "B1", "severity": "blocker", "filePath": "/repo/src/Main.go", "line": 40}]"#,
    );

    let output = dry_run(dir.path(), &["--fail-on", "info"]);
    assert!(output.status.success());
}

#[test]
fn dry_run_prints_writes_and_json_outcome() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        r#"[{"message": "M1", "severity": "critical", "filePath": "/repo/src/Main.go", "line": 2}]"#,
    );

    let output = dry_run(dir.path(), &["--format", "json", "--commit", "a2b4"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[dry-run] comment src/Main.go:2: M1"));
    assert!(stderr.contains("status SonarQube = failed"));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["issues"][0]["diffPath"], "src/Main.go");
    assert_eq!(json["gate"]["state"], "failed");
}

#[test]
fn no_gate_skips_the_status() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        r#"[{"message": "M1", "severity": "critical", "filePath": "/repo/src/Main.go", "line": 2}]"#,
    );

    let output = dry_run(dir.path(), &["--no-gate", "--no-summary"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("[dry-run] status"));
    assert!(!stderr.contains("[dry-run] summary"));
}

#[test]
fn unknown_severity_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), "[]");

    let output = dry_run(dir.path(), &["--fail-on", "bug"]);
    assert!(!output.status.success());
}
