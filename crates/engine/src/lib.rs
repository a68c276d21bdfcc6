//! # Qualstat Engine
//!
//! Turns a researcher's selection of qualitative codes, documents and document
//! groups into observed frequency tables for chi-square testing, and decides
//! whether the prepared data is safe to test.
//!
//! ## Architecture
//!
//! ```text
//! TestRequest + ProjectSnapshot
//!     │
//!     ├──> Dispatcher (test type / subtype / request validation)
//!     │
//!     ├──> Builder
//!     │    ├─> goodness-of-fit: codes            (1-D)
//!     │    ├─> independence:    codes × documents
//!     │    └─> homogeneity:     codes × document groups
//!     │
//!     ├──> Category combination (optional)
//!     │
//!     └──> validateOnly ? Assumption report
//!                       : NumericService → post-processed result
//! ```
//!
//! Everything except the service call is a pure function of its inputs.

mod assumptions;
mod builders;
mod combine;
mod dispatcher;
mod error;
mod ids;
mod model;
mod service;
mod store;
mod table;

pub use assumptions::{
    check_categorical_data, check_contingency, check_goodness_of_fit,
    check_independence_of_observations, check_random_sampling, expected_frequencies,
    goodness_of_fit_expected, margins, validate_contingency, validate_goodness_of_fit,
    AssumptionCheck, AssumptionReport, CheckDetails, CheckStatus, ContingencyDetails,
    GoodnessOfFitDetails, Margins, Suggestion, MAX_LOW_CELL_PERCENT, MIN_EXPECTED_FREQUENCY,
    MIN_VIABLE_EXPECTED_FREQUENCY,
};
pub use builders::{
    build_goodness_of_fit, build_homogeneity, build_independence, UNKNOWN_CODE_LABEL,
    UNKNOWN_DOCUMENT_LABEL,
};
pub use combine::{combine_rows, CombinedRows};
pub use dispatcher::{
    dispatch, dispatch_from_store, post_process, prepare, validate_request, DispatchOutcome,
    PreparationSummary, PreparedTable, PreparedTest, FISHERS_DISPLAY_SUBTYPE,
};
pub use error::{EngineError, Result};
pub use ids::{normalize_id, normalize_opt};
pub use model::{AnnotationRecord, CodeDefinition, Document, ProjectSnapshot};
pub use service::NumericService;
pub use store::{validate_project_id, InMemoryProjectStore, ProjectStore};
pub use table::{ContingencyTable, FrequencyVector};
