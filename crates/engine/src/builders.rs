//! Observed-table builders.
//!
//! Each builder scans every coded segment of the project once and attributes it
//! to at most one cell: the row of its code and the column of its document (or
//! document group). Segments whose code or document is outside the selection
//! are skipped.

use crate::ids::normalize_id;
use crate::model::ProjectSnapshot;
use crate::table::{ContingencyTable, FrequencyVector};
use qualstat_protocol::{DocGroups, EntityRef};
use std::collections::{HashMap, HashSet};

pub const UNKNOWN_CODE_LABEL: &str = "Unknown Code";
pub const UNKNOWN_DOCUMENT_LABEL: &str = "Unknown Document";

/// Ordered selection of ids with a position lookup.
///
/// Unusable references keep their slot (as an empty id) so the table stays
/// aligned with the request, but never match a segment. Repeated ids map to
/// their first position.
struct Selection {
    ids: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Selection {
    fn new(refs: &[EntityRef]) -> Self {
        let ids: Vec<String> = refs
            .iter()
            .map(|r| normalize_id(r).unwrap_or_default())
            .collect();
        let mut positions = HashMap::with_capacity(ids.len());
        for (idx, id) in ids.iter().enumerate() {
            if !id.is_empty() {
                positions.entry(id.clone()).or_insert(idx);
            }
        }
        Self { ids, positions }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn labels(&self, names: &HashMap<String, &str>, fallback: impl Fn(&str) -> String) -> Vec<String> {
        self.ids
            .iter()
            .map(|id| match names.get(id) {
                Some(name) => (*name).to_string(),
                None => fallback(id),
            })
            .collect()
    }
}

/// Count segments into `observed[row][col]`. Returns how many were counted.
fn tally<F>(
    project: &ProjectSnapshot,
    rows: &Selection,
    column_of: F,
    observed: &mut [Vec<u64>],
) -> usize
where
    F: Fn(&str) -> Option<usize>,
{
    let mut counted = 0usize;
    for segment in &project.coded_segments {
        let Some(col) = segment.document_id().as_deref().and_then(&column_of) else {
            continue;
        };
        let Some(row) = segment.code_id().as_deref().and_then(|id| rows.position(id)) else {
            continue;
        };
        observed[row][col] += 1;
        counted += 1;
    }
    log::debug!(
        "tallied {counted} of {} coded segments into a {}x{} table",
        project.coded_segments.len(),
        observed.len(),
        observed.first().map_or(0, Vec::len)
    );
    counted
}

/// Goodness-of-fit: counts per selected code over the selected documents.
pub fn build_goodness_of_fit(
    project: &ProjectSnapshot,
    codes: &[EntityRef],
    documents: &[EntityRef],
) -> FrequencyVector {
    let rows = Selection::new(codes);
    let docs: HashSet<String> = documents.iter().filter_map(normalize_id).collect();

    let mut observed = vec![vec![0u64; 1]; rows.len()];
    tally(
        project,
        &rows,
        |doc| docs.contains(doc).then_some(0),
        &mut observed,
    );

    let labels = rows.labels(&project.code_names(), |id| {
        if id.is_empty() {
            UNKNOWN_CODE_LABEL.to_string()
        } else {
            id.to_string()
        }
    });

    FrequencyVector {
        observed: observed.into_iter().map(|row| row[0]).collect(),
        code_ids: rows.ids,
        labels,
    }
}

/// Independence: codes × documents.
pub fn build_independence(
    project: &ProjectSnapshot,
    codes: &[EntityRef],
    documents: &[EntityRef],
) -> ContingencyTable {
    let rows = Selection::new(codes);
    let cols = Selection::new(documents);

    let row_labels = rows.labels(&project.code_names(), |_| UNKNOWN_CODE_LABEL.to_string());
    let col_labels = cols.labels(&project.document_names(), |_| {
        UNKNOWN_DOCUMENT_LABEL.to_string()
    });

    let mut table = ContingencyTable::zeroed(rows.ids.clone(), row_labels, col_labels);
    tally(project, &rows, |doc| cols.position(doc), &mut table.observed);
    table
}

/// Homogeneity: codes × user-defined document groups.
///
/// A document listed in several groups is counted in the last group that lists it.
pub fn build_homogeneity(
    project: &ProjectSnapshot,
    codes: &[EntityRef],
    groups: &DocGroups,
) -> ContingencyTable {
    let rows = Selection::new(codes);

    let mut group_of: HashMap<String, usize> = HashMap::new();
    for (group_idx, group) in groups.iter().enumerate() {
        for doc in group.documents.iter().filter_map(normalize_id) {
            if let Some(previous) = group_of.insert(doc.clone(), group_idx) {
                if previous != group_idx {
                    log::warn!(
                        "document {doc} appears in groups '{}' and '{}'; counting it in '{}'",
                        groups.0[previous].name,
                        group.name,
                        group.name
                    );
                }
            }
        }
    }

    let row_labels = rows.labels(&project.code_names(), |_| UNKNOWN_CODE_LABEL.to_string());
    let mut table = ContingencyTable::zeroed(rows.ids.clone(), row_labels, groups.names());
    tally(
        project,
        &rows,
        |doc| group_of.get(doc).copied(),
        &mut table.observed,
    );
    table
}
