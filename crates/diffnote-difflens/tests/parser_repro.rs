use diffnote_core::{Finding, Severity};
use diffnote_difflens::hunk::HunkRange;
use diffnote_difflens::matcher::IssueDiffMatcher;
use diffnote_difflens::parser::{parse_commit_diffs, split_git_patch};

#[test]
fn parse_patch_without_git_header() {
    let diff = "\
--- /dev/null
+++ b/demo/bad_code.rs
@@ -0,0 +1,3 @@
+fn main() {
+    println!(\"hello\");
+}
";
    let entries = split_git_patch(diff).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].new_file);
    assert_eq!(entries[0].new_path, "demo/bad_code.rs");

    let diffs = parse_commit_diffs(&entries).unwrap();
    assert_eq!(diffs[0].ranges, vec![HunkRange::new(1, 3)]);
}

#[test]
fn patch_to_mapped_issues() {
    let diff = "\
diff --git a/src/Main.go b/src/Main.go
index 1111111..2222222 100644
--- a/src/Main.go
+++ b/src/Main.go
@@ -1,4 +1,5 @@
 package main
+import \"fmt\"
 func main() {
 }

diff --git a/src/Old.go b/src/Old.go
deleted file mode 100644
--- a/src/Old.go
+++ /dev/null
@@ -1,2 +0,0 @@
-package main
-func old() {}
";
    let diffs = parse_commit_diffs(&split_git_patch(diff).unwrap()).unwrap();
    assert_eq!(diffs.len(), 1);

    let finding = |path: &str, line| Finding {
        message: "M".into(),
        severity: Severity::Minor,
        file_path: path.into(),
        line,
    };
    let mapped = IssueDiffMatcher::new(&diffs)
        .map_all(&[
            finding("/work/src/Main.go", Some(2)),
            finding("/work/src/Main.go", Some(9)),
            finding("/work/src/Old.go", Some(1)),
        ])
        .unwrap();

    assert_eq!(mapped.len(), 1);
    assert_eq!(mapped[0].diff_path, "src/Main.go");
    assert_eq!(mapped[0].resolved_line, Some(2));
}
