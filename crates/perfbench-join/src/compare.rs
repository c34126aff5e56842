//! Data equality with diagnostic logging
//!
//! Text is compared line by line, so a trailing newline is insignificant.
//! Tables compare row count first, then rows in order. Mismatches are
//! explained at debug level.

use perfbench_report::ItemData;
use tracing::debug;

/// Whether two `data` slots hold the same value
#[must_use]
pub fn data_equal(left: &ItemData, right: &ItemData) -> bool {
    match (left, right) {
        (ItemData::Text(a), ItemData::Text(b)) => {
            let equal = a.lines().eq(b.lines());
            if !equal {
                debug!(diff = %line_diff(a, b).join("\n"), "text mismatch");
            }
            equal
        }
        (ItemData::Rows(a), ItemData::Rows(b)) => {
            if a.len() != b.len() {
                debug!(left = a.len(), right = b.len(), "row count mismatch");
                return false;
            }
            match a.iter().zip(b).position(|(x, y)| x != y) {
                Some(index) => {
                    debug!(index, left = ?a[index], right = ?b[index], "row mismatch");
                    false
                }
                None => true,
            }
        }
        _ => left == right,
    }
}

/// Largest middle section, in LCS table cells, that gets a line-level diff
pub const MAX_DIFF_CELLS: usize = 1 << 20;

/// Line diff with `"  "`, `"- "` and `"+ "` prefixes
///
/// Common leading and trailing lines are matched first. When the differing
/// middle would need more than [`MAX_DIFF_CELLS`] table cells, it is shown as
/// a whole removal followed by a whole addition.
#[must_use]
pub fn line_diff(left: &str, right: &str) -> Vec<String> {
    let a: Vec<&str> = left.lines().collect();
    let b: Vec<&str> = right.lines().collect();

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (mid_a, mid_b) = (&a[prefix..a.len() - suffix], &b[prefix..b.len() - suffix]);

    let mut out = Vec::with_capacity(a.len().max(b.len()));
    out.extend(a[..prefix].iter().map(|line| format!("  {line}")));
    let cells = (mid_a.len() + 1).saturating_mul(mid_b.len() + 1);
    if cells > MAX_DIFF_CELLS {
        debug!(left = mid_a.len(), right = mid_b.len(), "text too large for a line diff");
        out.extend(mid_a.iter().map(|line| format!("- {line}")));
        out.extend(mid_b.iter().map(|line| format!("+ {line}")));
    } else {
        lcs_diff(mid_a, mid_b, &mut out);
    }
    out.extend(a[a.len() - suffix..].iter().map(|line| format!("  {line}")));
    out
}

fn lcs_diff(a: &[&str], b: &[&str], out: &mut Vec<String>) {
    // lcs[i][j] = longest common subsequence of a[i..] and b[j..]
    let mut lcs = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(format!("  {}", a[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            out.push(format!("- {}", a[i]));
            i += 1;
        } else {
            out.push(format!("+ {}", b[j]));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|line| format!("- {line}")));
    out.extend(b[j..].iter().map(|line| format!("+ {line}")));
}
