//! Category combination: merge code rows into user-named groups before testing.

use crate::ids::normalize_id;
use crate::table::{ContingencyTable, FrequencyVector};
use qualstat_protocol::CodeCombination;
use std::collections::{HashMap, HashSet};

/// Rows after combination, in output order: one row per combination,
/// then every row no combination consumed, in original order.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRows {
    pub rows: Vec<Vec<u64>>,
    pub ids: Vec<String>,
    pub labels: Vec<String>,
}

/// Merge `rows` according to `groups`.
///
/// `width` is the column count used for groups none of whose ids match a row.
/// Ids that match no row contribute nothing. Each row is merged at most once:
/// an id repeated within a group, or claimed again by a later group, adds
/// nothing further, so the table total never changes. Every row carrying a
/// matched id is consumed, including repeated selection slots.
pub fn combine_rows(
    rows: &[Vec<u64>],
    ids: &[String],
    labels: &[String],
    width: usize,
    groups: &[CodeCombination],
) -> CombinedRows {
    if groups.is_empty() {
        return CombinedRows {
            rows: rows.to_vec(),
            ids: ids.to_vec(),
            labels: labels.to_vec(),
        };
    }

    let mut positions: HashMap<&str, Vec<usize>> = HashMap::with_capacity(ids.len());
    for (idx, id) in ids.iter().enumerate() {
        positions.entry(id.as_str()).or_default().push(idx);
    }

    let mut consumed: HashSet<usize> = HashSet::new();
    let mut out = CombinedRows {
        rows: Vec::with_capacity(groups.len() + ids.len()),
        ids: Vec::with_capacity(groups.len() + ids.len()),
        labels: Vec::with_capacity(groups.len() + ids.len()),
    };

    for group in groups {
        let mut merged = vec![0u64; width];
        let mut matched = 0usize;
        for original in group.original_code_ids.iter().filter_map(normalize_id) {
            let Some(slots) = positions.get(original.as_str()) else {
                log::debug!("combination '{}' skips unknown code {original}", group.new_name);
                continue;
            };
            for &idx in slots {
                if !consumed.insert(idx) {
                    continue;
                }
                let row = &rows[idx];
                if merged.len() < row.len() {
                    merged.resize(row.len(), 0);
                }
                for (acc, value) in merged.iter_mut().zip(row) {
                    *acc += value;
                }
                matched += 1;
            }
        }
        log::debug!(
            "combination '{}' merged {matched} of {} rows",
            group.new_name,
            group.original_code_ids.len()
        );
        out.rows.push(merged);
        out.ids.push(group.new_name.clone());
        out.labels.push(group.new_name.clone());
    }

    for (idx, row) in rows.iter().enumerate() {
        if consumed.contains(&idx) {
            continue;
        }
        out.rows.push(row.clone());
        out.ids.push(ids[idx].clone());
        out.labels.push(labels.get(idx).cloned().unwrap_or_default());
    }

    out
}

impl ContingencyTable {
    /// Apply combinations to the rows. Column labels and the original
    /// (pre-combination) rows are kept.
    pub fn combine(self, groups: &[CodeCombination]) -> Self {
        if groups.is_empty() {
            return self;
        }
        let width = self.cols();
        let combined = combine_rows(&self.observed, &self.row_ids, &self.row_labels, width, groups);
        Self {
            observed: combined.rows,
            row_ids: combined.ids,
            row_labels: combined.labels,
            combinations_applied: self.combinations_applied + groups.len(),
            ..self
        }
    }
}

impl FrequencyVector {
    /// Apply combinations to the categories.
    pub fn combine(self, groups: &[CodeCombination]) -> Self {
        if groups.is_empty() {
            return self;
        }
        let rows: Vec<Vec<u64>> = self.observed.iter().map(|count| vec![*count]).collect();
        let combined = combine_rows(&rows, &self.code_ids, &self.labels, 1, groups);
        Self {
            observed: combined
                .rows
                .iter()
                .map(|row| row.first().copied().unwrap_or(0))
                .collect(),
            code_ids: combined.ids,
            labels: combined.labels,
        }
    }
}
