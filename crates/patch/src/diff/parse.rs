#![forbid(unsafe_code)]

use super::{DEV_NULL, FileDiff, Hunk, HunkLine};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    #[error("malformed diff at line {line}: {detail}")]
    Malformed { line: usize, detail: String },
}

fn malformed(line_index: usize, detail: impl Into<String>) -> DiffError {
    DiffError::Malformed {
        line: line_index + 1,
        detail: detail.into(),
    }
}

struct PendingFile {
    diff: FileDiff,
    has_file_headers: bool,
}

impl PendingFile {
    fn new() -> Self {
        Self {
            diff: FileDiff::default(),
            has_file_headers: false,
        }
    }
}

/// Split a unified diff (plain or `git diff` flavoured) into per-file sections.
///
/// `rename from`, `copy from` and the new/deleted file mode headers are recorded; other lines
/// outside file headers and hunks (`index`, `similarity`, commentary) are skipped. Hunk bodies
/// must agree with the counts in their `@@` header.
pub fn parse_unified_diff(text: &str) -> Result<Vec<FileDiff>, DiffError> {
    let mut lines = text.split('\n').collect::<Vec<_>>();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut files = Vec::new();
    let mut current: Option<PendingFile> = None;
    let mut idx = 0usize;

    while idx < lines.len() {
        let line = lines[idx];
        let header = line.trim_end_matches('\r');

        if let Some(rest) = header.strip_prefix("diff --git ") {
            flush(&mut files, current.take());
            let mut pending = PendingFile::new();
            if let Some((old, new)) = split_git_names(rest) {
                pending.diff.old_name = Some(old);
                pending.diff.new_name = Some(new);
            }
            current = Some(pending);
            idx += 1;
            continue;
        }

        if header.starts_with("--- ")
            && lines
                .get(idx + 1)
                .is_some_and(|next| next.starts_with("+++ "))
        {
            let starts_new_file = current
                .as_ref()
                .is_none_or(|c| c.has_file_headers || !c.diff.hunks.is_empty());
            if starts_new_file {
                flush(&mut files, current.take());
            }
            let pending = current.get_or_insert_with(PendingFile::new);
            pending.diff.old_name = Some(parse_file_name(&header[4..]));
            pending.diff.new_name =
                Some(parse_file_name(&lines[idx + 1].trim_end_matches('\r')[4..]));
            pending.has_file_headers = true;
            idx += 2;
            continue;
        }

        if header.starts_with("@@") {
            let Some(pending) = current.as_mut() else {
                return Err(malformed(idx, "hunk appears before any file header"));
            };
            let (hunk, consumed) = parse_hunk(&lines, idx)?;
            pending.diff.hunks.push(hunk);
            idx += consumed;
            continue;
        }

        if let Some(pending) = current.as_mut().filter(|c| !c.has_file_headers) {
            if header.starts_with("new file mode") {
                pending.diff.old_name = Some(DEV_NULL.to_string());
                pending.diff.declares_mode = true;
            } else if header.starts_with("deleted file mode") {
                pending.diff.new_name = Some(DEV_NULL.to_string());
                pending.diff.declares_mode = true;
            } else if let Some(from) = header.strip_prefix("rename from ") {
                pending.diff.rename_from = Some(parse_file_name(from));
            } else if let Some(from) = header.strip_prefix("copy from ") {
                pending.diff.copy_from = Some(parse_file_name(from));
            }
        }
        idx += 1;
    }

    flush(&mut files, current.take());
    Ok(files)
}

fn flush(files: &mut Vec<FileDiff>, pending: Option<PendingFile>) {
    if let Some(pending) = pending {
        files.push(pending.diff);
    }
}

// `a/x b/x`; names containing " b/" are ambiguous and the last separator wins.
fn split_git_names(rest: &str) -> Option<(String, String)> {
    let (old, new) = rest.rsplit_once(" b/")?;
    Some((old.to_string(), format!("b/{new}")))
}

fn parse_file_name(raw: &str) -> String {
    let name = raw.split('\t').next().unwrap_or_default().trim_end();
    let name = name
        .strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .unwrap_or(name);
    name.to_string()
}

fn parse_range(raw: &str) -> Option<(usize, usize)> {
    match raw.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((raw.parse().ok()?, 1)),
    }
}

fn parse_hunk_header(header: &str) -> Option<(usize, usize, usize, usize)> {
    let body = header.strip_prefix("@@ ")?;
    let (ranges, _section) = body.split_once(" @@")?;
    let (old, new) = ranges.split_once(' ')?;
    let (old_start, old_len) = parse_range(old.strip_prefix('-')?)?;
    let (new_start, new_len) = parse_range(new.strip_prefix('+')?)?;
    Some((old_start, old_len, new_start, new_len))
}

fn parse_hunk(lines: &[&str], start: usize) -> Result<(Hunk, usize), DiffError> {
    let header = lines[start].trim_end_matches('\r');
    let (old_start, old_len, new_start, new_len) =
        parse_hunk_header(header).ok_or_else(|| malformed(start, "invalid hunk header"))?;

    let mut hunk = Hunk {
        old_start,
        old_len,
        new_start,
        new_len,
        lines: Vec::new(),
        old_missing_newline: false,
        new_missing_newline: false,
    };
    let mut old_left = old_len;
    let mut new_left = new_len;
    let mut idx = start + 1;

    while old_left > 0 || new_left > 0 {
        let Some(line) = lines.get(idx) else {
            return Err(malformed(idx, "hunk ends before its line counts are satisfied"));
        };
        if line.starts_with('\\') {
            mark_missing_newline(&mut hunk);
            idx += 1;
            continue;
        }

        // Some tools drop the single space of an empty context line.
        let (tag, text) = match line.chars().next() {
            None => (' ', ""),
            Some(tag) => (tag, &line[tag.len_utf8()..]),
        };
        match tag {
            ' ' if old_left > 0 && new_left > 0 => {
                old_left -= 1;
                new_left -= 1;
                hunk.lines.push(HunkLine::Context(text.to_string()));
            }
            '-' if old_left > 0 => {
                old_left -= 1;
                hunk.lines.push(HunkLine::Remove(text.to_string()));
            }
            '+' if new_left > 0 => {
                new_left -= 1;
                hunk.lines.push(HunkLine::Add(text.to_string()));
            }
            ' ' | '-' | '+' => {
                return Err(malformed(idx, "hunk body exceeds the counts in its header"));
            }
            _ => return Err(malformed(idx, format!("unexpected line in hunk: {line:?}"))),
        }
        idx += 1;
    }

    if lines.get(idx).is_some_and(|l| l.starts_with('\\')) {
        mark_missing_newline(&mut hunk);
        idx += 1;
    }

    Ok((hunk, idx - start))
}

fn mark_missing_newline(hunk: &mut Hunk) {
    match hunk.lines.last() {
        Some(HunkLine::Context(_)) => {
            hunk.old_missing_newline = true;
            hunk.new_missing_newline = true;
        }
        Some(HunkLine::Remove(_)) => hunk.old_missing_newline = true,
        Some(HunkLine::Add(_)) => hunk.new_missing_newline = true,
        None => {}
    }
}
