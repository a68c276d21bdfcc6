use serde::Serialize;

/// One-dimensional observed counts for a goodness-of-fit test, aligned with
/// the selected codes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyVector {
    pub observed: Vec<u64>,
    /// Code id per category (a combination's `newName` for merged categories)
    pub code_ids: Vec<String>,
    pub labels: Vec<String>,
}

impl FrequencyVector {
    pub fn total(&self) -> u64 {
        self.observed.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }
}

/// Two-dimensional observed counts: rows are codes (or merged code groups),
/// columns are documents or document groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContingencyTable {
    pub observed: Vec<Vec<u64>>,
    pub row_ids: Vec<String>,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// Rows as the builder produced them, before any combination.
    pub original_code_ids: Vec<String>,
    pub original_row_labels: Vec<String>,
    /// Number of combination groups applied to the rows.
    pub combinations_applied: usize,
}

impl ContingencyTable {
    pub fn rows(&self) -> usize {
        self.observed.len()
    }

    pub fn cols(&self) -> usize {
        self.col_labels.len()
    }

    pub fn total(&self) -> u64 {
        self.observed.iter().flatten().sum()
    }

    pub fn is_combined(&self) -> bool {
        self.combinations_applied > 0
    }

    pub(crate) fn zeroed(
        row_ids: Vec<String>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
    ) -> Self {
        let observed = vec![vec![0; col_labels.len()]; row_ids.len()];
        Self {
            observed,
            original_code_ids: row_ids.clone(),
            original_row_labels: row_labels.clone(),
            row_ids,
            row_labels,
            col_labels,
            combinations_applied: 0,
        }
    }
}
