use similar::{Algorithm, ChangeTag, TextDiff};

/// How far into a file to look for NUL bytes when sniffing for binary content.
const BINARY_SNIFF_LEN: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub line_type: DiffLineType,
    /// The line as stored, including its terminator if it had one.
    pub content: String,
    pub old_line_number: Option<usize>,
    pub new_line_number: Option<usize>,
}

impl DiffLine {
    /// The line without its trailing newline.
    pub fn text(&self) -> &str {
        self.content.trim_end_matches(['\n', '\r'])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineType {
    Context,
    Addition,
    Deletion,
}

/// Line-level change set between two byte sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diff {
    /// Every line of both sides in document order. Empty when the inputs are
    /// identical.
    Lines(Vec<DiffLine>),
    /// At least one side is not text and the two sides differ.
    BinaryDiffers { old_size: usize, new_size: usize },
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        matches!(self, Diff::Lines(lines) if lines.is_empty())
    }

    pub fn lines(&self) -> &[DiffLine] {
        match self {
            Diff::Lines(lines) => lines,
            Diff::BinaryDiffers { .. } => &[],
        }
    }

    pub fn additions(&self) -> usize {
        self.count(DiffLineType::Addition)
    }

    pub fn deletions(&self) -> usize {
        self.count(DiffLineType::Deletion)
    }

    fn count(&self, line_type: DiffLineType) -> usize {
        self.lines()
            .iter()
            .filter(|l| l.line_type == line_type)
            .count()
    }
}

/// Heuristic text/binary split: a NUL byte near the start or invalid UTF-8.
pub fn is_binary(bytes: &[u8]) -> bool {
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    sniff.contains(&0) || std::str::from_utf8(bytes).is_err()
}

/// Computes a Myers line diff between `old` and `new`.
pub fn diff(old: &[u8], new: &[u8]) -> Diff {
    if old == new {
        return Diff::Lines(Vec::new());
    }

    match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(old_text), Ok(new_text)) if !is_binary(old) && !is_binary(new) => {
            Diff::Lines(compute_diff(old_text, new_text))
        }
        _ => Diff::BinaryDiffers {
            old_size: old.len(),
            new_size: new.len(),
        },
    }
}

fn compute_diff(old_text: &str, new_text: &str) -> Vec<DiffLine> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old_text, new_text);
    let mut lines = Vec::new();
    let mut old_line_num = 1;
    let mut new_line_num = 1;

    for change in diff.iter_all_changes() {
        let (line_type, old_num, new_num) = match change.tag() {
            ChangeTag::Delete => {
                let num = old_line_num;
                old_line_num += 1;
                (DiffLineType::Deletion, Some(num), None)
            }
            ChangeTag::Insert => {
                let num = new_line_num;
                new_line_num += 1;
                (DiffLineType::Addition, None, Some(num))
            }
            ChangeTag::Equal => {
                let old_num = old_line_num;
                let new_num = new_line_num;
                old_line_num += 1;
                new_line_num += 1;
                (DiffLineType::Context, Some(old_num), Some(new_num))
            }
        };

        lines.push(DiffLine {
            line_type,
            content: change.value().to_string(),
            old_line_number: old_num,
            new_line_number: new_num,
        });
    }

    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
    Unchanged,
}

impl FileStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Deleted => "deleted",
            FileStatus::Modified => "modified",
            FileStatus::Unchanged => "unchanged",
        }
    }
}

/// The diff of one path between two snapshots.
#[derive(Debug, Clone)]
pub struct FileDiff {
    pub path: String,
    pub status: FileStatus,
    pub diff: Diff,
}

impl FileDiff {
    /// An absent side is treated as empty content.
    pub fn between(path: &str, old: Option<&[u8]>, new: Option<&[u8]>) -> Self {
        let status = match (old, new) {
            (None, _) => FileStatus::Added,
            (_, None) => FileStatus::Deleted,
            (Some(o), Some(n)) if o == n => FileStatus::Unchanged,
            _ => FileStatus::Modified,
        };

        FileDiff {
            path: path.to_string(),
            status,
            diff: diff(old.unwrap_or_default(), new.unwrap_or_default()),
        }
    }

    pub fn format_unified(&self, context_lines: usize) -> String {
        let mut output = String::new();

        let (from, to) = match self.status {
            FileStatus::Added => ("/dev/null".to_string(), format!("b/{}", self.path)),
            FileStatus::Deleted => (format!("a/{}", self.path), "/dev/null".to_string()),
            _ => (format!("a/{}", self.path), format!("b/{}", self.path)),
        };

        let lines = match &self.diff {
            Diff::BinaryDiffers { .. } => {
                output.push_str(&format!("Binary files {} and {} differ\n", from, to));
                return output;
            }
            Diff::Lines(lines) if lines.is_empty() => return output,
            Diff::Lines(lines) => lines,
        };

        output.push_str(&format!("--- {}\n", from));
        output.push_str(&format!("+++ {}\n", to));

        for (start, end) in hunk_ranges(lines, context_lines) {
            let before = &lines[..start];
            let hunk = &lines[start..end];

            let old_before = before
                .iter()
                .filter(|l| l.line_type != DiffLineType::Addition)
                .count();
            let new_before = before
                .iter()
                .filter(|l| l.line_type != DiffLineType::Deletion)
                .count();
            let old_count = hunk
                .iter()
                .filter(|l| l.line_type != DiffLineType::Addition)
                .count();
            let new_count = hunk
                .iter()
                .filter(|l| l.line_type != DiffLineType::Deletion)
                .count();

            output.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                if old_count > 0 { old_before + 1 } else { old_before },
                old_count,
                if new_count > 0 { new_before + 1 } else { new_before },
                new_count
            ));

            for line in hunk {
                let prefix = match line.line_type {
                    DiffLineType::Addition => "+",
                    DiffLineType::Deletion => "-",
                    DiffLineType::Context => " ",
                };
                output.push_str(prefix);
                output.push_str(&line.content);
                if !line.content.ends_with('\n') {
                    output.push_str("\n\\ No newline at end of file\n");
                }
            }
        }

        output
    }
}

/// Groups changed lines into `[start, end)` windows padded with up to
/// `context` unchanged lines on each side; windows that touch are merged.
fn hunk_ranges(lines: &[DiffLine], context: usize) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if line.line_type == DiffLineType::Context {
            continue;
        }
        let start = i.saturating_sub(context);
        let end = (i + context + 1).min(lines.len());

        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }

    ranges
}
