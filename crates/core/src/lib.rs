#![forbid(unsafe_code)]

pub mod paths {
    /// Lexically normalize a project-relative path.
    ///
    /// Backslashes become `/`, empty and `.` segments collapse, and `seg/..` folds away. Leading
    /// `..` segments survive so callers can tell that the path climbs out of its base.
    pub fn normalize_relative_path(input: &str) -> String {
        let replaced = input.trim().replace('\\', "/");
        let absolute = replaced.starts_with('/');
        let mut segments: Vec<&str> = Vec::new();
        for segment in replaced.split('/') {
            match segment {
                "" | "." => {}
                ".." => match segments.last() {
                    Some(last) if *last != ".." => {
                        segments.pop();
                    }
                    _ if absolute => {}
                    _ => segments.push(".."),
                },
                other => segments.push(other),
            }
        }
        let joined = segments.join("/");
        if absolute { format!("/{joined}") } else { joined }
    }

    /// True when a normalized relative path cannot name a file inside its base directory.
    pub fn escapes_base(normalized: &str) -> bool {
        if normalized.is_empty() || normalized.starts_with('/') {
            return true;
        }
        let first = normalized.split('/').next().unwrap_or_default();
        first == ".." || is_drive_prefix(first)
    }

    // `C:` style prefixes are absolute on Windows even after normalization.
    fn is_drive_prefix(segment: &str) -> bool {
        let bytes = segment.as_bytes();
        bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
    }
}

pub mod policy;

#[cfg(test)]
mod tests {
    use super::paths::*;

    #[test]
    fn normalize_collapses_separators_and_dots() {
        assert_eq!(normalize_relative_path("./docs/readme.md"), "docs/readme.md");
        assert_eq!(normalize_relative_path("docs\\guide\\intro.md"), "docs/guide/intro.md");
        assert_eq!(normalize_relative_path("a//b/./c/"), "a/b/c");
        assert_eq!(normalize_relative_path("a/b/../c"), "a/c");
        assert_eq!(normalize_relative_path("."), "");
    }

    #[test]
    fn normalize_keeps_leading_parent_segments() {
        assert_eq!(normalize_relative_path("../../etc/passwd"), "../../etc/passwd");
        assert_eq!(normalize_relative_path("a/../../b"), "../b");
        assert_eq!(normalize_relative_path("/etc/../passwd"), "/passwd");
    }

    #[test]
    fn escape_detection() {
        assert!(escapes_base(""));
        assert!(escapes_base("/etc/passwd"));
        assert!(escapes_base("../secret"));
        assert!(escapes_base("C:/Windows/system.ini"));
        assert!(!escapes_base("scenes/main.tscn"));
        assert!(!escapes_base("..hidden/file"));
        assert!(escapes_base("d:notes.txt"));
        assert!(!escapes_base("foo:bar.txt"));
        assert!(!escapes_base("docs/a:b.md"));
    }
}
