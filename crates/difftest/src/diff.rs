//! Line-based unified diff of two captured outputs.

use std::ops::Range;

/// Unchanged lines shown around each change.
const CONTEXT: usize = 3;

/// Edits searched for before the changed region is shown as one block.
const MAX_EDIT_DISTANCE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

#[derive(Debug, Clone, Copy)]
struct Edit<'a> {
    op: Op,
    line: &'a str,
}

/// Render a unified diff turning `old` into `new`.
///
/// Returns an empty string only when the inputs are identical. Lines keep
/// their terminators while being compared, so outputs that differ only by a
/// trailing newline still produce a hunk (marked with
/// `\ No newline at end of file`).
#[must_use]
pub fn unified_diff(old: &str, new: &str, old_label: &str, new_label: &str) -> String {
    if old == new {
        return String::new();
    }

    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new.split_inclusive('\n').collect();
    let edits = edit_script(&old_lines, &new_lines);

    let mut out = format!("--- {old_label}\n+++ {new_label}\n");
    let (mut old_line, mut new_line, mut cursor) = (0, 0, 0);
    for range in hunk_ranges(&edits) {
        let (skipped_old, skipped_new) = line_counts(&edits[cursor..range.start]);
        old_line += skipped_old;
        new_line += skipped_new;

        let hunk = &edits[range.clone()];
        render_hunk(&mut out, hunk, old_line, new_line);
        let (hunk_old, hunk_new) = line_counts(hunk);
        old_line += hunk_old;
        new_line += hunk_new;
        cursor = range.end;
    }
    out
}

/// Edit script after peeling off the common prefix and suffix.
///
/// The middle is diffed with [`shortest_edit`]; when that gives up, the
/// whole middle is shown as removed and then added.
fn edit_script<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<Edit<'a>> {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let a = &old[prefix..old.len() - suffix];
    let b = &new[prefix..new.len() - suffix];

    let equal = |line: &'a str| Edit {
        op: Op::Equal,
        line,
    };
    let mut edits: Vec<Edit<'a>> = Vec::with_capacity(old.len() + new.len());
    edits.extend(old[..prefix].iter().copied().map(equal));

    if let Some(ops) = shortest_edit(a, b) {
        let (mut i, mut j) = (0, 0);
        for op in ops {
            let line = match op {
                Op::Equal => {
                    i += 1;
                    j += 1;
                    a[i - 1]
                }
                Op::Delete => {
                    i += 1;
                    a[i - 1]
                }
                Op::Insert => {
                    j += 1;
                    b[j - 1]
                }
            };
            edits.push(Edit { op, line });
        }
    } else {
        tracing::debug!(
            old_lines = a.len(),
            new_lines = b.len(),
            "edit distance too large, diffing as one block"
        );
        edits.extend(a.iter().map(|&line| Edit {
            op: Op::Delete,
            line,
        }));
        edits.extend(b.iter().map(|&line| Edit {
            op: Op::Insert,
            line,
        }));
    }

    edits.extend(old[old.len() - suffix..].iter().copied().map(equal));
    edits
}

/// Myers' greedy shortest edit script, or `None` once more than
/// [`MAX_EDIT_DISTANCE`] edits would be needed.
///
/// Only diagonals of the same parity as `d` are reachable after `d` edits,
/// so `trace[d][q]` holds the furthest `x` on diagonal `k = 2q - d`. Memory
/// is bounded by the square of the edit distance, not the input sizes. On
/// ties the deletion is taken first.
fn shortest_edit(a: &[&str], b: &[&str]) -> Option<Vec<Op>> {
    let (n, m) = (a.len(), b.len());
    let mut trace: Vec<Vec<usize>> = Vec::new();

    for d in 0..=MAX_EDIT_DISTANCE.min(n + m) {
        let mut frontier = Vec::with_capacity(d + 1);
        for q in 0..=d {
            let mut x = match trace.last() {
                None => 0,
                Some(prev) if q == 0 || (q != d && prev[q - 1] < prev[q]) => prev[q],
                Some(prev) => prev[q - 1] + 1,
            };
            let mut y = x + d - 2 * q;
            while x < n && y < m && a[x] == b[y] {
                x += 1;
                y += 1;
            }
            frontier.push(x);

            if x >= n && y >= m {
                trace.push(frontier);
                return Some(backtrack(&trace, n, m));
            }
        }
        trace.push(frontier);
    }
    None
}

/// Walk the recorded frontiers back from `(n, m)` to the origin.
fn backtrack(trace: &[Vec<usize>], n: usize, m: usize) -> Vec<Op> {
    let mut ops = Vec::with_capacity(n + m);
    let (mut x, mut y) = (n, m);

    for d in (1..trace.len()).rev() {
        let prev = &trace[d - 1];
        let q = (x + d - y) / 2;
        let down = q == 0 || (q != d && prev[q - 1] < prev[q]);
        let (from_x, from_y, move_x, op) = if down {
            let from_x = prev[q];
            let from_y = from_x + d - 1 - 2 * q;
            (from_x, from_y, from_x, Op::Insert)
        } else {
            let from_x = prev[q - 1];
            let from_y = from_x + d + 1 - 2 * q;
            (from_x, from_y, from_x + 1, Op::Delete)
        };

        ops.extend(std::iter::repeat_n(Op::Equal, x - move_x));
        ops.push(op);
        x = from_x;
        y = from_y;
    }
    ops.extend(std::iter::repeat_n(Op::Equal, x));
    ops.reverse();
    ops
}

/// Group changes into hunks, merging those separated by at most
/// `2 * CONTEXT` unchanged lines.
fn hunk_ranges(edits: &[Edit<'_>]) -> Vec<Range<usize>> {
    let mut changes = edits
        .iter()
        .enumerate()
        .filter(|(_, e)| e.op != Op::Equal)
        .map(|(idx, _)| idx);

    let mut ranges = Vec::new();
    let Some(first) = changes.next() else {
        return ranges;
    };
    let close = |last: usize| (last + CONTEXT + 1).min(edits.len());

    let mut start = first.saturating_sub(CONTEXT);
    let mut last = first;
    for idx in changes {
        if idx - last - 1 > 2 * CONTEXT {
            ranges.push(start..close(last));
            start = idx - CONTEXT;
        }
        last = idx;
    }
    ranges.push(start..close(last));
    ranges
}

/// Old and new lines covered by `edits`.
fn line_counts(edits: &[Edit<'_>]) -> (usize, usize) {
    edits.iter().fold((0, 0), |(old, new), e| match e.op {
        Op::Equal => (old + 1, new + 1),
        Op::Delete => (old + 1, new),
        Op::Insert => (old, new + 1),
    })
}

fn render_hunk(out: &mut String, hunk: &[Edit<'_>], old_start: usize, new_start: usize) {
    let (old_len, new_len) = line_counts(hunk);
    out.push_str(&format!(
        "@@ -{} +{} @@\n",
        format_range(old_start, old_len),
        format_range(new_start, new_len)
    ));

    for edit in hunk {
        out.push(match edit.op {
            Op::Equal => ' ',
            Op::Delete => '-',
            Op::Insert => '+',
        });
        match edit.line.strip_suffix('\n') {
            Some(line) => {
                out.push_str(line);
                out.push('\n');
            }
            None => {
                out.push_str(edit.line);
                out.push_str("\n\\ No newline at end of file\n");
            }
        }
    }
}

/// Hunk range in unified-diff notation: 1-based start, length omitted when
/// it is one, and an empty range anchored on the preceding line.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(old: &str, new: &str) -> String {
        unified_diff(old, new, "mine", "reference")
    }

    #[test]
    fn identical_inputs_have_empty_diff() {
        assert_eq!(diff("a\nb\n", "a\nb\n"), "");
        assert_eq!(diff("", ""), "");
    }

    #[test]
    fn single_changed_line() {
        assert_eq!(
            diff("1\n2\n", "1\n3\n"),
            "--- mine\n+++ reference\n@@ -1,2 +1,2 @@\n 1\n-2\n+3\n"
        );
    }

    #[test]
    fn insertion_into_empty_output() {
        assert_eq!(
            diff("", "hello\n"),
            "--- mine\n+++ reference\n@@ -0,0 +1 @@\n+hello\n"
        );
    }

    #[test]
    fn missing_trailing_newline_is_reported() {
        let d = diff("a\n", "a");
        assert_eq!(
            d,
            "--- mine\n+++ reference\n@@ -1 +1 @@\n-a\n+a\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn context_is_limited_to_three_lines() {
        let old = "1\n2\n3\n4\n5\n6\n7\n8\n";
        let new = "1\n2\n3\n4\nX\n6\n7\n8\n";
        assert_eq!(
            diff(old, new),
            "--- mine\n+++ reference\n@@ -2,7 +2,7 @@\n 2\n 3\n 4\n-5\n+X\n 6\n 7\n 8\n"
        );
    }

    #[test]
    fn distant_changes_form_separate_hunks() {
        let old: String = (1..=20).map(|n| format!("{n}\n")).collect();
        let new = old.replacen("2\n", "two\n", 1).replace("19\n", "nineteen\n");
        let d = diff(&old, &new);
        assert_eq!(d.matches("@@ -").count(), 2, "{d}");
        assert!(d.contains("-2\n+two\n"));
        assert!(d.contains("-19\n+nineteen\n"));
    }

    #[test]
    fn nearby_changes_share_a_hunk() {
        let old = "a\nb\nc\nd\ne\nf\ng\nh\n";
        let new = "A\nb\nc\nd\ne\nf\ng\nH\n";
        let d = diff(old, new);
        assert_eq!(d.matches("@@ -").count(), 1, "{d}");
        assert!(d.contains("@@ -1,8 +1,8 @@"));
    }

    #[test]
    fn deletion_only() {
        assert_eq!(
            diff("keep\ndrop\n", "keep\n"),
            "--- mine\n+++ reference\n@@ -1,2 +1 @@\n keep\n-drop\n"
        );
    }

    fn numbered(prefix: &str, count: usize) -> String {
        (0..count).map(|i| format!("{prefix}{i}\n")).collect()
    }

    #[test]
    fn large_fully_differing_outputs_diff_as_one_block() {
        let old = numbered("a", 30_000);
        let new = numbered("b", 30_000);
        let d = diff(&old, &new);

        let body: Vec<&str> = d.lines().skip(2).collect();
        assert_eq!(body[0], "@@ -1,30000 +1,30000 @@");
        assert_eq!(body.iter().filter(|l| l.starts_with('-')).count(), 30_000);
        assert_eq!(body.iter().filter(|l| l.starts_with('+')).count(), 30_000);
        assert_eq!(body[1], "-a0");
        assert_eq!(body[30_001], "+b0");
        assert_eq!(body.last(), Some(&"+b29999"));
    }

    #[test]
    fn many_scattered_changes_stay_minimal() {
        let old = numbered("line", 4_000);
        let new: String = (0..4_000)
            .map(|i| {
                if i % 10 == 0 {
                    format!("changed{i}\n")
                } else {
                    format!("line{i}\n")
                }
            })
            .collect();
        let d = diff(&old, &new);
        assert_eq!(d.lines().filter(|l| l.starts_with("-line")).count(), 400);
        assert_eq!(d.lines().filter(|l| l.starts_with("+changed")).count(), 400);
        assert!(d.contains("-line3990\n"), "{d}");
        assert!(d.contains("+changed3990\n"), "{d}");
    }

    #[test]
    fn insertion_between_common_lines_is_minimal() {
        assert_eq!(
            diff("a\nb\nc\n", "a\nb\nx\ny\nc\n"),
            "--- mine\n+++ reference\n@@ -1,3 +1,5 @@\n a\n b\n+x\n+y\n c\n"
        );
    }
}
