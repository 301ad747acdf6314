//! Result-set equivalence
//!
//! Compares the rows of a normalized query with those of its denormalized
//! counterpart. Numbers compare within an absolute tolerance, NULL equals
//! NULL and every other value compares exactly.

use jl_db::result::canonical_row_cmp;
use jl_db::{Cell, ResultSet};
use serde::Serialize;
use std::collections::HashSet;

/// Row that differs at one position of an ordered comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalMismatch {
    /// Zero-based row index
    pub index: usize,
    /// `None` when the normalized result has no row at this index
    pub normalized: Option<Vec<Cell>>,
    /// `None` when the denormalized result has no row at this index
    pub denormalized: Option<Vec<Cell>>,
}

/// Outcome of comparing two result sets
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparison {
    /// Whether the comparison holds
    pub matches: bool,

    /// How columns were aligned, when not trivially
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    /// Set when the column counts differ; rows are not compared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_mismatch: Option<String>,

    /// Ordered comparisons: rows that differ by position
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub positional: Vec<PositionalMismatch>,

    /// Unordered comparisons: normalized rows with no denormalized match.
    /// For subset checks these are the omitted rows.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub only_in_normalized: Vec<Vec<Cell>>,

    /// Unordered comparisons: denormalized rows with no normalized match
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub only_in_denormalized: Vec<Vec<Cell>>,
}

impl Comparison {
    fn column_mismatch(message: String) -> Self {
        Self {
            matches: false,
            column_mismatch: Some(message),
            ..Self::default()
        }
    }
}

/// Compare two cells
pub fn cells_equal(a: &Cell, b: &Cell, epsilon: f64) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y || (x - y).abs() <= epsilon,
        _ => a == b,
    }
}

/// Compare two rows cell by cell
pub fn rows_equal(a: &[Cell], b: &[Cell], epsilon: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| cells_equal(x, y, epsilon))
}

/// Bring the denormalized rows into the normalized column order.
///
/// When both sides name the same columns (case-insensitive, no duplicates)
/// the denormalized columns are reordered by name. Otherwise columns are
/// paired by position and a note records the differing names. Differing
/// column counts are an error.
pub fn align_columns(
    normalized: &ResultSet,
    denormalized: &ResultSet,
) -> Result<(Vec<Vec<Cell>>, Vec<String>), String> {
    if normalized.columns.len() != denormalized.columns.len() {
        return Err(format!(
            "normalized query returns {} columns ({}), denormalized query returns {} ({})",
            normalized.columns.len(),
            normalized.columns.join(", "),
            denormalized.columns.len(),
            denormalized.columns.join(", ")
        ));
    }

    let lower = |columns: &[String]| -> Vec<String> {
        columns.iter().map(|c| c.to_lowercase()).collect()
    };
    let norm_names = lower(&normalized.columns);
    let denorm_names = lower(&denormalized.columns);

    if norm_names == denorm_names {
        return Ok((denormalized.rows.clone(), Vec::new()));
    }

    let norm_set: HashSet<&String> = norm_names.iter().collect();
    let denorm_set: HashSet<&String> = denorm_names.iter().collect();
    let unique_names = norm_set.len() == norm_names.len() && denorm_set.len() == denorm_names.len();

    if unique_names && norm_set == denorm_set {
        let mapping: Vec<usize> = norm_names
            .iter()
            .filter_map(|name| denorm_names.iter().position(|d| d == name))
            .collect();
        let rows = denormalized
            .rows
            .iter()
            .map(|row| mapping.iter().map(|&i| row[i].clone()).collect())
            .collect();
        let note = format!(
            "denormalized columns reordered by name to ({})",
            normalized.columns.join(", ")
        );
        return Ok((rows, vec![note]));
    }

    let note = format!(
        "columns compared by position: ({}) vs ({})",
        normalized.columns.join(", "),
        denormalized.columns.join(", ")
    );
    Ok((denormalized.rows.clone(), vec![note]))
}

/// Pair the rows of two multisets and return the unmatched rows of each side.
///
/// Rows without numeric cells compare exactly and are paired directly.
/// Rows with numeric cells are paired within `epsilon` by a maximum bipartite
/// matching, so a row that fits several candidates never blocks a complete
/// pairing. Unmatched rows come back in canonical order.
fn multiset_difference(
    left: &[Vec<Cell>],
    right: &[Vec<Cell>],
    epsilon: f64,
) -> (Vec<Vec<Cell>>, Vec<Vec<Cell>>) {
    let mut left: Vec<&Vec<Cell>> = left.iter().collect();
    let mut right: Vec<&Vec<Cell>> = right.iter().collect();
    left.sort_by(|a, b| canonical_row_cmp(a, b));
    right.sort_by(|a, b| canonical_row_cmp(a, b));

    let mut right_taken = vec![false; right.len()];
    let mut loose_left: Vec<usize> = Vec::new();
    let mut only_left = Vec::new();
    for (l, row) in left.iter().enumerate() {
        if has_numeric(row) {
            loose_left.push(l);
            continue;
        }
        let exact = right
            .iter()
            .enumerate()
            .position(|(r, candidate)| !right_taken[r] && rows_equal(row, candidate, epsilon));
        match exact {
            Some(r) => right_taken[r] = true,
            None => only_left.push((*row).clone()),
        }
    }

    let loose_right: Vec<usize> = (0..right.len())
        .filter(|&r| !right_taken[r] && has_numeric(right[r]))
        .collect();
    let candidates: Vec<Vec<usize>> = loose_left
        .iter()
        .map(|&l| {
            loose_right
                .iter()
                .enumerate()
                .filter(|&(_, &r)| rows_equal(left[l], right[r], epsilon))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    // matched_by[j] = index into loose_left paired with loose_right[j]
    let mut matched_by: Vec<Option<usize>> = vec![None; loose_right.len()];
    for i in 0..loose_left.len() {
        let mut visited = vec![false; loose_right.len()];
        if !augment(i, &candidates, &mut visited, &mut matched_by) {
            only_left.push(left[loose_left[i]].clone());
        }
    }

    for (&r, matched) in loose_right.iter().zip(&matched_by) {
        if matched.is_some() {
            right_taken[r] = true;
        }
    }
    only_left.sort_by(|a, b| canonical_row_cmp(a, b));

    let only_right = right
        .into_iter()
        .zip(right_taken)
        .filter(|(_, taken)| !taken)
        .map(|(row, _)| row.clone())
        .collect();

    (only_left, only_right)
}

fn has_numeric(row: &[Cell]) -> bool {
    row.iter().any(|cell| cell.as_f64().is_some())
}

/// Find an augmenting path from left row `i` (Kuhn's algorithm)
fn augment(
    i: usize,
    candidates: &[Vec<usize>],
    visited: &mut [bool],
    matched_by: &mut [Option<usize>],
) -> bool {
    for &j in &candidates[i] {
        if visited[j] {
            continue;
        }
        visited[j] = true;
        let free = match matched_by[j] {
            None => true,
            Some(other) => augment(other, candidates, visited, matched_by),
        };
        if free {
            matched_by[j] = Some(i);
            return true;
        }
    }
    false
}

/// Compare two result sets for logical equivalence.
///
/// With `ordered` rows are compared by position, otherwise as multisets.
pub fn compare(
    normalized: &ResultSet,
    denormalized: &ResultSet,
    ordered: bool,
    epsilon: f64,
) -> Comparison {
    let (denorm_rows, notes) = match align_columns(normalized, denormalized) {
        Ok(aligned) => aligned,
        Err(message) => return Comparison::column_mismatch(message),
    };

    let mut comparison = Comparison {
        notes,
        ..Comparison::default()
    };

    if ordered {
        let len = normalized.rows.len().max(denorm_rows.len());
        for index in 0..len {
            let left = normalized.rows.get(index);
            let right = denorm_rows.get(index);
            let same = matches!((left, right), (Some(a), Some(b)) if rows_equal(a, b, epsilon));
            if !same {
                comparison.positional.push(PositionalMismatch {
                    index,
                    normalized: left.cloned(),
                    denormalized: right.cloned(),
                });
            }
        }
        comparison.matches = comparison.positional.is_empty();
    } else {
        let (only_norm, only_denorm) = multiset_difference(&normalized.rows, &denorm_rows, epsilon);
        comparison.matches = only_norm.is_empty() && only_denorm.is_empty();
        comparison.only_in_normalized = only_norm;
        comparison.only_in_denormalized = only_denorm;
    }

    comparison
}

/// Check that the denormalized rows are a sub-multiset of the normalized rows.
///
/// Used for entries the denormalized schema cannot answer completely. The
/// comparison holds when every denormalized row is matched; unmatched
/// normalized rows are reported in `only_in_normalized` as omitted rows.
pub fn subset_check(normalized: &ResultSet, denormalized: &ResultSet, epsilon: f64) -> Comparison {
    let (denorm_rows, notes) = match align_columns(normalized, denormalized) {
        Ok(aligned) => aligned,
        Err(message) => return Comparison::column_mismatch(message),
    };

    let (omitted, extra) = multiset_difference(&normalized.rows, &denorm_rows, epsilon);
    Comparison {
        matches: extra.is_empty(),
        notes,
        column_mismatch: None,
        positional: Vec::new(),
        only_in_normalized: omitted,
        only_in_denormalized: extra,
    }
}

#[cfg(test)]
#[path = "equivalence_test.rs"]
mod tests;
