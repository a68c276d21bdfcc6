//! Assumption checks for chi-square tests.
//!
//! Every check is a pure function returning an immutable [`AssumptionCheck`];
//! [`AssumptionReport::compose`] assembles the four checks into a report.
//! Expected frequencies always come from the table passed in, so a combined
//! table is judged on its own marginals.

use crate::table::{ContingencyTable, FrequencyVector};
use qualstat_protocol::{Distribution, DistributionKind};
use serde::Serialize;

/// Chi-square approximation wants every expected count at or above this.
pub const MIN_EXPECTED_FREQUENCY: f64 = 5.0;
/// Below this expected count a contingency test is not reliable at all.
pub const MIN_VIABLE_EXPECTED_FREQUENCY: f64 = 1.0;
/// Share of cells (percent) allowed below [`MIN_EXPECTED_FREQUENCY`].
pub const MAX_LOW_CELL_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Warning,
    Pending,
}

/// Remediation offered when the expected-frequency check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Suggestion {
    #[default]
    None,
    Fishers,
    Combine,
}

impl Suggestion {
    /// Fisher's Exact for 2×2 tables, merging categories otherwise.
    pub fn for_shape(rows: usize, cols: usize) -> Self {
        if rows == 2 && cols == 2 {
            Self::Fishers
        } else {
            Self::Combine
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodnessOfFitDetails {
    pub observed: Vec<u64>,
    pub expected: Vec<f64>,
    pub labels: Vec<String>,
    pub total: u64,
    pub categories: usize,
    pub categories_less_than_five: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContingencyDetails {
    pub observed: Vec<Vec<u64>>,
    pub expected: Vec<Vec<f64>>,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub row_totals: Vec<u64>,
    pub col_totals: Vec<u64>,
    pub grand_total: u64,
    pub total_cells: usize,
    pub cells_less_than_one: usize,
    pub cells_less_than_five: usize,
    pub percent_less_than_five: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_code_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_row_labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckDetails {
    GoodnessOfFit(GoodnessOfFitDetails),
    Contingency(ContingencyDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssumptionCheck {
    pub status: CheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<CheckDetails>,
}

impl AssumptionCheck {
    fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    fn passed(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Passed, message)
    }

    fn warning(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Warning, message)
    }

    fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    fn with_details(mut self, details: CheckDetails) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssumptionReport {
    pub independence_of_observations: AssumptionCheck,
    pub categorical_data: AssumptionCheck,
    pub expected_frequency: AssumptionCheck,
    pub random_sampling: AssumptionCheck,
    pub suggestion: Suggestion,
    pub can_proceed: bool,
}

impl AssumptionReport {
    pub fn compose(
        independence_of_observations: AssumptionCheck,
        categorical_data: AssumptionCheck,
        expected_frequency: AssumptionCheck,
        random_sampling: AssumptionCheck,
    ) -> Self {
        let suggestion = expected_frequency.suggestion.unwrap_or_default();
        let can_proceed = [
            &independence_of_observations,
            &categorical_data,
            &expected_frequency,
            &random_sampling,
        ]
        .iter()
        .all(|check| check.status != CheckStatus::Warning);
        Self {
            independence_of_observations,
            categorical_data,
            expected_frequency,
            random_sampling,
            suggestion,
            can_proceed,
        }
    }
}

pub fn check_independence_of_observations() -> AssumptionCheck {
    AssumptionCheck::passed(
        "Each coded segment is counted once, in exactly one cell of the table.",
    )
}

pub fn check_categorical_data() -> AssumptionCheck {
    AssumptionCheck::passed("Codes, documents and document groups are categorical variables.")
}

pub fn check_random_sampling() -> AssumptionCheck {
    AssumptionCheck::new(
        CheckStatus::Pending,
        "Random sampling depends on how the documents were collected and cannot be verified \
         from the data. Confirm that the documents are a random sample of the population.",
    )
}

/// Expected counts for a goodness-of-fit test. Custom proportions are
/// percentages and are used as given, whatever their sum.
pub fn goodness_of_fit_expected(vector: &FrequencyVector, distribution: &Distribution) -> Vec<f64> {
    let total = vector.total() as f64;
    match distribution.kind {
        DistributionKind::Uniform if vector.is_empty() => Vec::new(),
        DistributionKind::Uniform => vec![total / vector.len() as f64; vector.len()],
        DistributionKind::Custom => vector
            .code_ids
            .iter()
            .map(|id| total * distribution.proportion_for(id) / 100.0)
            .collect(),
    }
}

pub fn check_goodness_of_fit(vector: &FrequencyVector, distribution: &Distribution) -> AssumptionCheck {
    let categories = vector.len();
    if categories < 2 {
        return AssumptionCheck::warning(format!(
            "A goodness-of-fit test needs at least 2 categories; {categories} selected."
        ));
    }
    let total = vector.total();
    if total == 0 {
        return AssumptionCheck::warning(
            "No coded segments were found for the selected codes and documents.",
        );
    }

    let expected = goodness_of_fit_expected(vector, distribution);
    let low = expected
        .iter()
        .filter(|e| **e < MIN_EXPECTED_FREQUENCY)
        .count();

    let details = CheckDetails::GoodnessOfFit(GoodnessOfFitDetails {
        observed: vector.observed.clone(),
        expected,
        labels: vector.labels.clone(),
        total,
        categories,
        categories_less_than_five: low,
    });

    let check = if low > 0 {
        AssumptionCheck::warning(format!(
            "{low} of {categories} categories have an expected frequency below 5. \
             The accuracy of the test may be reduced."
        ))
    } else {
        AssumptionCheck::passed("All categories have an expected frequency of at least 5.")
    };
    check.with_details(details)
}

/// Row totals, column totals and grand total of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Margins {
    pub row_totals: Vec<u64>,
    pub col_totals: Vec<u64>,
    pub grand_total: u64,
}

pub fn margins(observed: &[Vec<u64>]) -> Margins {
    let cols = observed.iter().map(Vec::len).max().unwrap_or(0);
    let mut col_totals = vec![0u64; cols];
    let row_totals = observed
        .iter()
        .map(|row| {
            for (acc, value) in col_totals.iter_mut().zip(row) {
                *acc += value;
            }
            row.iter().sum()
        })
        .collect::<Vec<u64>>();
    let grand_total = row_totals.iter().sum();
    Margins {
        row_totals,
        col_totals,
        grand_total,
    }
}

/// `E[i][j] = rowTotal[i] * colTotal[j] / grandTotal`; `None` for an empty table.
pub fn expected_frequencies(observed: &[Vec<u64>]) -> Option<Vec<Vec<f64>>> {
    let m = margins(observed);
    if m.grand_total == 0 {
        return None;
    }
    let grand = m.grand_total as f64;
    Some(
        m.row_totals
            .iter()
            .map(|row_total| {
                m.col_totals
                    .iter()
                    .map(|col_total| (*row_total as f64) * (*col_total as f64) / grand)
                    .collect()
            })
            .collect(),
    )
}

pub fn check_contingency(table: &ContingencyTable) -> AssumptionCheck {
    let rows = table.rows();
    let cols = table.cols();
    if rows == 0 || cols == 0 {
        return AssumptionCheck::warning(
            "The contingency table is empty: select at least one code and one document or group.",
        );
    }
    if table.observed.iter().any(|row| row.len() != cols) {
        return AssumptionCheck::warning("The contingency table rows have inconsistent lengths.");
    }

    let m = margins(&table.observed);
    let Some(expected) = expected_frequencies(&table.observed) else {
        return AssumptionCheck::warning(
            "No coded segments were found for the selected codes and documents.",
        );
    };

    let total_cells = rows * cols;
    let cells = expected.iter().flatten();
    let less_than_one = cells
        .clone()
        .filter(|e| **e < MIN_VIABLE_EXPECTED_FREQUENCY)
        .count();
    let less_than_five = cells.filter(|e| **e < MIN_EXPECTED_FREQUENCY).count();
    let percent_less_than_five = less_than_five as f64 * 100.0 / total_cells as f64;

    let details = CheckDetails::Contingency(ContingencyDetails {
        observed: table.observed.clone(),
        expected,
        row_labels: table.row_labels.clone(),
        col_labels: table.col_labels.clone(),
        row_totals: m.row_totals,
        col_totals: m.col_totals,
        grand_total: m.grand_total,
        total_cells,
        cells_less_than_one: less_than_one,
        cells_less_than_five: less_than_five,
        percent_less_than_five,
        original_code_ids: table
            .is_combined()
            .then(|| table.original_code_ids.clone()),
        original_row_labels: table
            .is_combined()
            .then(|| table.original_row_labels.clone()),
    });

    let check = if less_than_one > 0 {
        AssumptionCheck::warning(format!(
            "{less_than_one} cell(s) have an expected frequency below 1. \
             The chi-square test is not reliable for this data."
        ))
        .with_suggestion(Suggestion::for_shape(rows, cols))
    } else if percent_less_than_five > MAX_LOW_CELL_PERCENT {
        AssumptionCheck::warning(format!(
            "{percent_less_than_five:.1}% of cells have an expected frequency below 5 \
             (more than 20%). The accuracy of the chi-square test may be reduced."
        ))
        .with_suggestion(Suggestion::for_shape(rows, cols))
    } else {
        AssumptionCheck::passed(
            "All expected frequencies meet the minimum requirements; the sample size is large enough.",
        )
    };
    check.with_details(details)
}

pub fn validate_goodness_of_fit(
    vector: &FrequencyVector,
    distribution: &Distribution,
) -> AssumptionReport {
    AssumptionReport::compose(
        check_independence_of_observations(),
        check_categorical_data(),
        check_goodness_of_fit(vector, distribution),
        check_random_sampling(),
    )
}

pub fn validate_contingency(table: &ContingencyTable) -> AssumptionReport {
    AssumptionReport::compose(
        check_independence_of_observations(),
        check_categorical_data(),
        check_contingency(table),
        check_random_sampling(),
    )
}
