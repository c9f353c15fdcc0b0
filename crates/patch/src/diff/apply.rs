#![forbid(unsafe_code)]

use super::FileDiff;

/// A hunk whose old-side lines are not present in the pre-image.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("hunk {hunk} (old line {old_start}) does not match the current content")]
pub struct HunkMismatch {
    /// 1-based hunk ordinal within the file section.
    pub hunk: usize,
    pub old_start: usize,
}

/// Apply every hunk of `diff` to `original`, producing the post-image.
///
/// Matching is exact. A hunk is tried at its declared line first, then at the nearest offset
/// where its old side matches verbatim; hunks apply in order and never overlap.
pub fn apply_file_diff(original: &str, diff: &FileDiff) -> Result<String, HunkMismatch> {
    let (lines, had_trailing_newline) = split_lines(original);
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut cursor = 0usize;
    let mut trailing_newline = had_trailing_newline;

    for (ordinal, hunk) in diff.hunks.iter().enumerate() {
        let mismatch = || HunkMismatch {
            hunk: ordinal + 1,
            old_start: hunk.old_start,
        };
        let old = hunk.old_lines();
        let new = hunk.new_lines();
        let expected = if hunk.old_len == 0 {
            hunk.old_start
        } else {
            hunk.old_start.saturating_sub(1)
        };

        let pos = locate(&lines, &old, expected, cursor).ok_or_else(mismatch)?;
        let end = pos + old.len();

        if end == lines.len() {
            // The hunk owns end-of-file, so its markers decide the trailing newline.
            if !old.is_empty() && hunk.old_missing_newline == had_trailing_newline {
                return Err(mismatch());
            }
            trailing_newline = !hunk.new_missing_newline;
        }

        out.extend_from_slice(&lines[cursor..pos]);
        out.extend(new);
        cursor = end;
    }
    out.extend_from_slice(&lines[cursor..]);

    if out.is_empty() {
        return Ok(String::new());
    }
    let mut patched = out.join("\n");
    if trailing_newline {
        patched.push('\n');
    }
    Ok(patched)
}

fn split_lines(content: &str) -> (Vec<&str>, bool) {
    if content.is_empty() {
        return (Vec::new(), false);
    }
    match content.strip_suffix('\n') {
        Some(body) => (body.split('\n').collect(), true),
        None => (content.split('\n').collect(), false),
    }
}

fn locate(lines: &[&str], needle: &[&str], expected: usize, floor: usize) -> Option<usize> {
    if needle.is_empty() {
        let at = expected.max(floor);
        return (at <= lines.len()).then_some(at);
    }
    let max_start = lines.len().checked_sub(needle.len())?;
    if floor > max_start {
        return None;
    }
    (floor..=max_start)
        .filter(|&start| lines[start..start + needle.len()] == *needle)
        .min_by_key(|&start| start.abs_diff(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::parse_unified_diff;

    fn apply(original: &str, diff: &str) -> Result<String, HunkMismatch> {
        let files = parse_unified_diff(diff).expect("parse");
        apply_file_diff(original, &files[0])
    }

    #[test]
    fn creates_content_from_empty() {
        let out = apply("", "--- /dev/null\n+++ b/a.txt\n@@ -0,0 +1,2 @@\n+one\n+two\n");
        assert_eq!(out.expect("apply"), "one\ntwo\n");
    }

    #[test]
    fn replaces_single_line() {
        let out = apply("x\n", "--- a/b.txt\n+++ b/b.txt\n@@ -1 +1 @@\n-x\n+y\n");
        assert_eq!(out.expect("apply"), "y\n");
    }

    #[test]
    fn delete_produces_empty_post_image() {
        let out = apply("a\nb\n", "--- a/c\n+++ /dev/null\n@@ -1,2 +0,0 @@\n-a\n-b\n");
        assert_eq!(out.expect("apply"), "");
    }

    #[test]
    fn hunk_found_at_offset_when_lines_shifted() {
        let original = "new header\nalpha\nbeta\ngamma\n";
        let diff = "--- a/f\n+++ b/f\n@@ -1,3 +1,3 @@\n alpha\n-beta\n+BETA\n gamma\n";
        assert_eq!(
            apply(original, diff).expect("apply"),
            "new header\nalpha\nBETA\ngamma\n"
        );
    }

    #[test]
    fn drifted_content_is_a_mismatch() {
        let err = apply("x2\n", "--- a/b\n+++ b/b\n@@ -1 +1 @@\n-x\n+y\n").expect_err("drift");
        assert_eq!(err, HunkMismatch { hunk: 1, old_start: 1 });
    }

    #[test]
    fn whitespace_differences_are_not_forgiven() {
        let diff = "--- a/f\n+++ b/f\n@@ -1 +1 @@\n-\tcall()\n+\tcall(1)\n";
        assert!(apply("    call()\n", diff).is_err());
    }

    #[test]
    fn preserves_missing_trailing_newline_outside_hunks() {
        let original = "a\nb\nc\nd\ne\nf";
        let diff = "--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n-a\n+A\n b\n";
        assert_eq!(apply(original, diff).expect("apply"), "A\nb\nc\nd\ne\nf");
    }

    #[test]
    fn newline_markers_control_end_of_file() {
        let diff = "--- a/f\n+++ b/f\n@@ -1 +1 @@\n-old\n\\ No newline at end of file\n+new\n";
        assert_eq!(apply("old", diff).expect("apply"), "new\n");
        assert!(apply("old\n", diff).is_err(), "old side claims no trailing newline");
    }

    #[test]
    fn hunks_apply_in_order_without_overlap() {
        let original = "a\nb\nc\nd\n";
        let diff = "--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n a\n-b\n+B\n@@ -3,2 +3,2 @@\n c\n-d\n+D\n";
        assert_eq!(apply(original, diff).expect("apply"), "a\nB\nc\nD\n");
    }
}
