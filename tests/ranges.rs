use std::io::Write;
use std::process::{Command, Stdio};

const PATCH: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,3 +1,4 @@
 fn a() {}
+fn b() {}
 fn c() {}
 fn d() {}
@@ -20 +21,0 @@
-fn gone() {}
diff --git a/old.rs b/old.rs
deleted file mode 100644
--- a/old.rs
+++ /dev/null
@@ -1 +0,0 @@
-fn old() {}
";

fn ranges(args: &[&str], stdin: &str) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_diffnote"))
        .arg("ranges")
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
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn text_output_lists_changed_ranges() {
    let output = ranges(&[], PATCH);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "src/lib.rs: 1-4");
}

#[test]
fn json_output_keeps_empty_ranges() {
    let output = ranges(&["--format", "json"], PATCH);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = json.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["path"], "src/lib.rs");
    assert_eq!(files[0]["ranges"][0]["start"], 1);
    assert_eq!(files[0]["ranges"][0]["lineCount"], 4);
    assert_eq!(files[0]["ranges"][1]["lineCount"], 0);
}

#[test]
fn empty_input_is_an_error() {
    let output = ranges(&[], "");
    assert!(!output.status.success());
}

#[test]
fn malformed_header_is_an_error() {
    let output = ranges(&[], "--- a/x.rs\n+++ b/x.rs\n@@ -1 +z @@\n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("x.rs"));
}
