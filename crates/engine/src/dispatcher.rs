//! Request dispatch: validate a test request, build and combine its table, then
//! either report assumptions or hand the table to the numeric service.

use crate::assumptions::{validate_contingency, validate_goodness_of_fit, AssumptionReport};
use crate::builders::{build_goodness_of_fit, build_homogeneity, build_independence};
use crate::error::{EngineError, Result};
use crate::ids::normalize_id;
use crate::model::ProjectSnapshot;
use crate::service::NumericService;
use crate::store::ProjectStore;
use crate::table::{ContingencyTable, FrequencyVector};
use qualstat_protocol::{
    ChiSquareSubtype, CodeCombination, Distribution, DistributionKind, PayloadTable,
    ServicePayload, TestRequest, TEST_TYPE_CHI_SQUARE,
};
use serde::Serialize;
use serde_json::Value;

/// Display subtype the service result carries after a Fisher's Exact run.
pub const FISHERS_DISPLAY_SUBTYPE: &str = "Independence";

#[derive(Debug, Clone, PartialEq)]
pub enum PreparedTable {
    GoodnessOfFit {
        vector: FrequencyVector,
        distribution: Distribution,
    },
    Contingency(ContingencyTable),
}

/// A request turned into a (possibly combined) observed table.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTest {
    pub subtype: ChiSquareSubtype,
    pub table: PreparedTable,
}

/// Labels and pre-combination rows, attached to service results so a caller
/// can undo or re-target a combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparationSummary {
    pub row_labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub col_labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_code_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_row_labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchOutcome {
    /// `validateOnly` requests stop here; nothing is sent to the service.
    Validation(AssumptionReport),
    /// Post-processed numeric service response.
    Result(Value),
}

impl DispatchOutcome {
    /// Response body without the variant wrapper.
    pub fn into_json(self) -> Result<Value> {
        match self {
            Self::Validation(report) => Ok(serde_json::to_value(report)?),
            Self::Result(value) => Ok(value),
        }
    }
}

impl PreparedTest {
    /// Assumption report for the current (post-combination) table.
    pub fn validate(&self) -> AssumptionReport {
        match &self.table {
            PreparedTable::GoodnessOfFit {
                vector,
                distribution,
            } => validate_goodness_of_fit(vector, distribution),
            PreparedTable::Contingency(table) => validate_contingency(table),
        }
    }

    pub fn payload(&self) -> ServicePayload {
        let (table, distribution) = match &self.table {
            PreparedTable::GoodnessOfFit {
                vector,
                distribution,
            } => (
                PayloadTable::Vector {
                    observed: vector.observed.clone(),
                    codes: vector.code_ids.clone(),
                    category_labels: vector.labels.clone(),
                },
                Some(distribution.clone()),
            ),
            PreparedTable::Contingency(table) => (
                PayloadTable::Matrix {
                    observed: table.observed.clone(),
                    row_labels: table.row_labels.clone(),
                    col_labels: table.col_labels.clone(),
                },
                None,
            ),
        };
        ServicePayload {
            test_type: TEST_TYPE_CHI_SQUARE.to_string(),
            subtype: self.subtype.as_str().to_string(),
            table,
            distribution,
        }
    }

    pub fn summary(&self) -> PreparationSummary {
        match &self.table {
            PreparedTable::GoodnessOfFit { vector, .. } => PreparationSummary {
                row_labels: vector.labels.clone(),
                col_labels: Vec::new(),
                original_code_ids: None,
                original_row_labels: None,
            },
            PreparedTable::Contingency(table) => PreparationSummary {
                row_labels: table.row_labels.clone(),
                col_labels: table.col_labels.clone(),
                original_code_ids: table
                    .is_combined()
                    .then(|| table.original_code_ids.clone()),
                original_row_labels: table
                    .is_combined()
                    .then(|| table.original_row_labels.clone()),
            },
        }
    }
}

/// Configuration checks that need no project data. Returns the resolved subtype.
pub fn validate_request(request: &TestRequest) -> Result<ChiSquareSubtype> {
    if request.test_type.trim() != TEST_TYPE_CHI_SQUARE {
        return Err(EngineError::InvalidTestType(request.test_type.clone()));
    }
    let subtype = ChiSquareSubtype::parse(&request.subtype)
        .ok_or_else(|| EngineError::InvalidSubtype(request.subtype.clone()))?;

    for (idx, combination) in request.code_combinations.iter().enumerate() {
        if combination.new_name.trim().is_empty() {
            return Err(EngineError::invalid_request(format!(
                "codeCombinations[{idx}] has an empty newName"
            )));
        }
        if combination.original_code_ids.is_empty() {
            return Err(EngineError::invalid_request(format!(
                "codeCombinations[{idx}] ('{}') lists no originalCodeIds",
                combination.new_name
            )));
        }
    }

    match subtype {
        ChiSquareSubtype::Homogeneity if request.homo_doc_groups.is_none() => {
            return Err(EngineError::invalid_request(
                "homogeneity tests require homoDocGroups",
            ));
        }
        ChiSquareSubtype::GoodnessOfFit => {
            if let Some(distribution) = &request.distribution {
                if distribution.kind == DistributionKind::Custom
                    && distribution.proportions.is_none()
                {
                    return Err(EngineError::invalid_request(
                        "a custom distribution requires proportions",
                    ));
                }
            }
        }
        _ => {}
    }

    Ok(subtype)
}

/// Build (and combine) the observed table a request asks for.
pub fn prepare(request: &TestRequest, project: &ProjectSnapshot) -> Result<PreparedTest> {
    let subtype = validate_request(request)?;
    let combinations = &request.code_combinations;
    log::info!(
        "Preparing {} {} for project {} ({} combination(s))",
        request.test_type,
        subtype.as_str(),
        project.id,
        combinations.len()
    );

    let table = match subtype {
        ChiSquareSubtype::GoodnessOfFit => {
            let distribution = request.distribution.clone().unwrap_or_default();
            let vector = build_goodness_of_fit(project, &request.codes, &request.doc_list);
            PreparedTable::GoodnessOfFit {
                vector: vector.combine(combinations),
                distribution: merge_proportions(distribution, combinations),
            }
        }
        ChiSquareSubtype::Independence => PreparedTable::Contingency(
            build_independence(project, &request.indep_codes, &request.indep_docs)
                .combine(combinations),
        ),
        ChiSquareSubtype::Homogeneity | ChiSquareSubtype::FishersExact => {
            match &request.homo_doc_groups {
                Some(groups) => PreparedTable::Contingency(
                    build_homogeneity(project, &request.homo_codes, groups).combine(combinations),
                ),
                // validate_request guarantees groups for homogeneity
                None => PreparedTable::Contingency(
                    build_independence(project, &request.indep_codes, &request.indep_docs)
                        .combine(combinations),
                ),
            }
        }
    };

    if let PreparedTable::Contingency(table) = &table {
        log::debug!(
            "prepared {}x{} table, total {}",
            table.rows(),
            table.cols(),
            table.total()
        );
    }

    Ok(PreparedTest { subtype, table })
}

/// A merged goodness-of-fit category expects the sum of its members' shares.
fn merge_proportions(
    mut distribution: Distribution,
    combinations: &[CodeCombination],
) -> Distribution {
    if distribution.kind != DistributionKind::Custom || combinations.is_empty() {
        return distribution;
    }
    let merged: Vec<(String, f64)> = combinations
        .iter()
        .map(|combination| {
            let share = combination
                .original_code_ids
                .iter()
                .filter_map(normalize_id)
                .map(|id| distribution.proportion_for(&id))
                .sum();
            (combination.new_name.clone(), share)
        })
        .collect();
    let proportions = distribution.proportions.get_or_insert_with(Default::default);
    proportions.extend(merged);
    distribution
}

/// Enforce the service response contract.
///
/// A missing or null `pValue` is fatal; a missing `statistic` passes through.
/// Fisher's Exact results are relabelled as independence results with an
/// integer `df`.
pub fn post_process(
    subtype: ChiSquareSubtype,
    raw: Value,
    summary: &PreparationSummary,
) -> Result<Value> {
    let value = match raw {
        Value::String(text) => serde_json::from_str(&text).map_err(|err| {
            EngineError::upstream(None, format!("malformed response body: {err}"))
        })?,
        other => other,
    };
    let Value::Object(mut map) = value else {
        return Err(EngineError::upstream(
            None,
            "malformed response body: expected a JSON object",
        ));
    };

    if map.get("pValue").map_or(true, Value::is_null) {
        log::warn!("numeric service returned no pValue for {}", subtype.as_str());
        return Err(EngineError::MissingPValue);
    }

    if subtype == ChiSquareSubtype::FishersExact {
        map.insert(
            "subtype".to_string(),
            Value::String(FISHERS_DISPLAY_SUBTYPE.to_string()),
        );
        let df = normalize_df(map.get("df"));
        map.insert("df".to_string(), Value::from(df));
    }

    if !map.contains_key("preparation") {
        map.insert("preparation".to_string(), serde_json::to_value(summary)?);
    }

    Ok(Value::Object(map))
}

/// Integer degrees of freedom; `"N/A"`, null and unparseable values become 0.
fn normalize_df(df: Option<&Value>) -> i64 {
    match df {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(text)) if text.trim() != "N/A" => leading_integer(text).unwrap_or(0),
        _ => 0,
    }
}

/// Integer prefix of a string (`"3"`, `" -2"`, `"4.0"` → 3, -2, 4).
fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    trimmed[..sign_len + digits].parse().ok()
}

/// Full request path against an already loaded project.
pub async fn dispatch(
    request: &TestRequest,
    project: &ProjectSnapshot,
    service: &dyn NumericService,
) -> Result<DispatchOutcome> {
    let prepared = prepare(request, project)?;
    if request.validate_only {
        return Ok(DispatchOutcome::Validation(prepared.validate()));
    }

    let payload = prepared.payload();
    let raw = service.compute(&payload).await.map_err(|err| {
        log::warn!("numeric service call failed: {err}");
        err
    })?;
    let result = post_process(prepared.subtype, raw, &prepared.summary())?;
    Ok(DispatchOutcome::Result(result))
}

/// Load the request's project from `store`, then [`dispatch`].
///
/// Configuration errors are reported before the project is looked up.
pub async fn dispatch_from_store(
    request: &TestRequest,
    store: &dyn ProjectStore,
    service: &dyn NumericService,
) -> Result<DispatchOutcome> {
    validate_request(request)?;
    let project_id = request
        .project_id
        .as_deref()
        .ok_or_else(|| EngineError::invalid_request("projectId is required"))?;
    let project = store.load(project_id, request.owner_id.as_deref())?;
    dispatch(request, &project, service).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{CheckStatus, Suggestion};
    use crate::model::{AnnotationRecord, CodeDefinition, Document};
    use crate::store::InMemoryProjectStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use qualstat_protocol::EntityRef;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records payloads and answers with a canned response.
    struct StubService {
        response: std::result::Result<Value, (Option<u16>, String)>,
        seen: Mutex<Vec<Value>>,
    }

    impl StubService {
        fn answering(response: Value) -> Self {
            Self {
                response: Ok(response),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: Option<u16>, message: &str) -> Self {
            Self {
                response: Err((status, message.to_string())),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Value> {
            self.seen.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl NumericService for StubService {
        async fn compute(&self, payload: &ServicePayload) -> Result<Value> {
            self.seen
                .lock()
                .expect("lock")
                .push(serde_json::to_value(payload)?);
            match &self.response {
                Ok(value) => Ok(value.clone()),
                Err((status, message)) => Err(EngineError::upstream(*status, message.clone())),
            }
        }
    }

    fn segment(doc: &str, code: &str) -> AnnotationRecord {
        AnnotationRecord {
            id: None,
            file_id: Some(doc.into()),
            code_definition: Some(code.into()),
            start_index: 0,
            end_index: 0,
        }
    }

    fn project() -> ProjectSnapshot {
        let mut segments = Vec::new();
        for _ in 0..10 {
            segments.push(segment("d1", "A"));
            segments.push(segment("d1", "B"));
            segments.push(segment("d2", "A"));
            segments.push(segment("d2", "B"));
        }
        ProjectSnapshot {
            id: "p1".into(),
            owner: Some("u1".into()),
            code_definitions: ["A", "B", "C"]
                .iter()
                .map(|id| CodeDefinition {
                    id: (*id).into(),
                    name: format!("Code {id}"),
                    color: None,
                    description: None,
                })
                .collect(),
            coded_segments: segments,
            imported_files: ["d1", "d2"]
                .iter()
                .map(|id| Document {
                    id: (*id).into(),
                    name: format!("Doc {id}"),
                    content: String::new(),
                })
                .collect(),
        }
    }

    fn request(value: Value) -> TestRequest {
        serde_json::from_value(value).expect("request")
    }

    fn independence_request(validate_only: bool) -> TestRequest {
        request(json!({
            "projectId": "p1",
            "testType": "chi-square",
            "subtype": "independence",
            "validateOnly": validate_only,
            "indepCodes": ["A", "B"],
            "indepDocs": ["d1", "d2"]
        }))
    }

    #[test]
    fn rejects_other_test_types_and_subtypes() {
        let mut req = independence_request(true);
        req.test_type = "t-test".into();
        assert!(matches!(
            prepare(&req, &project()),
            Err(EngineError::InvalidTestType(_))
        ));

        let mut req = independence_request(true);
        req.subtype = "anova".into();
        assert!(matches!(
            prepare(&req, &project()),
            Err(EngineError::InvalidSubtype(_))
        ));
    }

    #[test]
    fn rejects_malformed_combinations_and_groupings() {
        let mut req = independence_request(true);
        req.code_combinations = vec![CodeCombination {
            new_name: " ".into(),
            original_code_ids: vec!["A".into()],
        }];
        assert!(matches!(
            validate_request(&req),
            Err(EngineError::InvalidRequest(_))
        ));

        req.code_combinations = vec![CodeCombination {
            new_name: "AB".into(),
            original_code_ids: Vec::new(),
        }];
        assert!(matches!(
            validate_request(&req),
            Err(EngineError::InvalidRequest(_))
        ));

        let req = request(json!({
            "testType": "chi-square",
            "subtype": "homogeneity",
            "homoCodes": ["A"]
        }));
        assert!(matches!(
            validate_request(&req),
            Err(EngineError::InvalidRequest(_))
        ));

        let req = request(json!({
            "testType": "chi-square",
            "subtype": "goodness-of-fit",
            "distribution": {"type": "custom"}
        }));
        assert!(matches!(
            validate_request(&req),
            Err(EngineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn fishers_exact_uses_groups_when_present() {
        let req = request(json!({
            "testType": "chi-square",
            "subtype": "fishers-exact",
            "homoCodes": ["A", "B"],
            "homoDocGroups": {"G1": ["d1"], "G2": ["d2"]},
            "indepCodes": ["A"],
            "indepDocs": ["d1"]
        }));
        let prepared = prepare(&req, &project()).expect("prepared");
        let PreparedTable::Contingency(table) = prepared.table else {
            panic!("expected a contingency table");
        };
        assert_eq!(table.col_labels, vec!["G1".to_string(), "G2".to_string()]);
        assert_eq!(table.observed, vec![vec![10, 10], vec![10, 10]]);
    }

    #[test]
    fn fishers_exact_falls_back_to_independence_selection() {
        let req = request(json!({
            "testType": "chi-square",
            "subtype": "fishers-exact",
            "indepCodes": ["A", "B"],
            "indepDocs": ["d1", "d2"]
        }));
        let prepared = prepare(&req, &project()).expect("prepared");
        assert_eq!(prepared.payload().subtype, "fishers-exact");
        let PreparedTable::Contingency(table) = prepared.table else {
            panic!("expected a contingency table");
        };
        assert_eq!(table.col_labels, vec!["Doc d1".to_string(), "Doc d2".to_string()]);
    }

    #[test]
    fn custom_proportions_follow_combinations() {
        let req = request(json!({
            "testType": "chi-square",
            "subtype": "goodness-of-fit",
            "codes": ["A", "B", "C"],
            "docList": ["d1"],
            "distribution": {"type": "custom", "proportions": {"A": 30, "B": 20, "C": 50}},
            "codeCombinations": [{"newName": "AB", "originalCodeIds": ["A", "B"]}]
        }));
        let prepared = prepare(&req, &project()).expect("prepared");
        let PreparedTable::GoodnessOfFit {
            vector,
            distribution,
        } = &prepared.table
        else {
            panic!("expected a vector");
        };
        assert_eq!(vector.observed, vec![20, 0]);
        assert_eq!(vector.code_ids, vec!["AB".to_string(), "C".to_string()]);
        assert_eq!(distribution.proportion_for("AB"), 50.0);

        let payload = serde_json::to_value(prepared.payload()).expect("json");
        assert_eq!(payload["codes"], json!(["AB", "C"]));
        assert_eq!(payload["distribution"]["proportions"]["AB"], json!(50.0));
    }

    #[test]
    fn missing_distribution_defaults_to_uniform() {
        let req = request(json!({
            "testType": "chi-square",
            "subtype": "goodness-of-fit",
            "codes": ["A", "B"],
            "docList": ["d1", "d2"]
        }));
        let prepared = prepare(&req, &project()).expect("prepared");
        let payload = serde_json::to_value(prepared.payload()).expect("json");
        assert_eq!(payload["distribution"], json!({"type": "uniform"}));
        assert_eq!(payload["observed"], json!([20, 20]));
    }

    #[tokio::test]
    async fn validate_only_never_calls_the_service() {
        let service = StubService::answering(json!({"pValue": 0.5}));
        let outcome = dispatch(&independence_request(true), &project(), &service)
            .await
            .expect("outcome");
        let DispatchOutcome::Validation(report) = outcome else {
            panic!("expected a validation report");
        };
        assert_eq!(report.expected_frequency.status, CheckStatus::Passed);
        assert_eq!(report.suggestion, Suggestion::None);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn run_forwards_the_prepared_table() {
        let service = StubService::answering(json!({
            "subtype": "Independence",
            "statistic": 0.0,
            "pValue": 1.0,
            "df": 1
        }));
        let outcome = dispatch(&independence_request(false), &project(), &service)
            .await
            .expect("outcome");

        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            json!({
                "testType": "chi-square",
                "subtype": "independence",
                "observed": [[10, 10], [10, 10]],
                "rowLabels": ["Code A", "Code B"],
                "colLabels": ["Doc d1", "Doc d2"]
            })
        );

        let DispatchOutcome::Result(result) = outcome else {
            panic!("expected a result");
        };
        assert_eq!(result["df"], json!(1));
        assert_eq!(result["preparation"]["rowLabels"], json!(["Code A", "Code B"]));
    }

    #[tokio::test]
    async fn upstream_failures_propagate() {
        let service = StubService::failing(Some(400), "Validation error: All observed values are zero");
        let err = dispatch(&independence_request(false), &project(), &service)
            .await
            .expect_err("upstream error");
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn store_dispatch_checks_configuration_before_lookup() {
        let store: InMemoryProjectStore = [project()].into_iter().collect();
        let service = StubService::answering(json!({"pValue": 0.5}));

        let mut req = independence_request(true);
        req.project_id = Some("missing".into());
        req.test_type = "anova".into();
        assert!(matches!(
            dispatch_from_store(&req, &store, &service).await,
            Err(EngineError::InvalidTestType(_))
        ));

        req.test_type = "chi-square".into();
        assert!(matches!(
            dispatch_from_store(&req, &store, &service).await,
            Err(EngineError::ProjectNotFound(_))
        ));

        let mut req = independence_request(true);
        req.owner_id = Some("intruder".into());
        assert!(matches!(
            dispatch_from_store(&req, &store, &service).await,
            Err(EngineError::ProjectNotFound(_))
        ));

        req.owner_id = Some("u1".into());
        assert!(dispatch_from_store(&req, &store, &service).await.is_ok());
    }

    #[test]
    fn fishers_post_processing_relabels_and_zeroes_df() {
        let summary = PreparationSummary {
            row_labels: vec!["A".into(), "B".into()],
            col_labels: vec!["d1".into(), "d2".into()],
            original_code_ids: None,
            original_row_labels: None,
        };
        let result = post_process(
            ChiSquareSubtype::FishersExact,
            json!({"subtype": "independence", "df": "N/A", "pValue": 0.03, "statistic": 2.1}),
            &summary,
        )
        .expect("result");
        assert_eq!(result["subtype"], json!("Independence"));
        assert_eq!(result["df"], json!(0));
        assert_eq!(result["pValue"], json!(0.03));
        assert_eq!(result["statistic"], json!(2.1));
    }

    #[test]
    fn post_processing_contract() {
        let summary = PreparationSummary {
            row_labels: Vec::new(),
            col_labels: Vec::new(),
            original_code_ids: None,
            original_row_labels: None,
        };

        let missing = post_process(ChiSquareSubtype::Independence, json!({"statistic": 1.0}), &summary);
        assert!(matches!(missing, Err(EngineError::MissingPValue)));

        let null = post_process(
            ChiSquareSubtype::Independence,
            json!({"statistic": 1.0, "pValue": null}),
            &summary,
        );
        assert!(matches!(null, Err(EngineError::MissingPValue)));

        let no_statistic = post_process(
            ChiSquareSubtype::Homogeneity,
            json!({"statistic": null, "pValue": 1.0, "df": 2}),
            &summary,
        )
        .expect("statistic may be null");
        assert!(no_statistic["statistic"].is_null());
        assert_eq!(no_statistic["df"], json!(2));

        let encoded = post_process(
            ChiSquareSubtype::FishersExact,
            Value::String(r#"{"pValue": 0.2, "df": "3"}"#.to_string()),
            &summary,
        )
        .expect("string body");
        assert_eq!(encoded["df"], json!(3));

        let garbage = post_process(
            ChiSquareSubtype::Independence,
            Value::String("not json".into()),
            &summary,
        );
        assert!(matches!(garbage, Err(EngineError::Upstream { .. })));

        let array = post_process(ChiSquareSubtype::Independence, json!([1, 2]), &summary);
        assert!(matches!(array, Err(EngineError::Upstream { .. })));
    }

    #[test]
    fn df_normalization() {
        assert_eq!(normalize_df(Some(&json!(4))), 4);
        assert_eq!(normalize_df(Some(&json!(2.0))), 2);
        assert_eq!(normalize_df(Some(&json!("5"))), 5);
        assert_eq!(normalize_df(Some(&json!("4.0"))), 4);
        assert_eq!(normalize_df(Some(&json!("N/A"))), 0);
        assert_eq!(normalize_df(Some(&json!("abc"))), 0);
        assert_eq!(normalize_df(Some(&Value::Null)), 0);
        assert_eq!(normalize_df(None), 0);
    }

    #[test]
    fn combined_independence_keeps_original_rows_in_summary() {
        let mut req = independence_request(true);
        req.indep_codes = vec!["A".into(), "B".into(), "C".into()];
        req.code_combinations = vec![CodeCombination {
            new_name: "AB".into(),
            original_code_ids: vec![EntityRef::from("A"), EntityRef::from("B")],
        }];
        let prepared = prepare(&req, &project()).expect("prepared");
        let summary = prepared.summary();
        assert_eq!(summary.row_labels, vec!["AB".to_string(), "Code C".to_string()]);
        assert_eq!(
            summary.original_code_ids,
            Some(vec!["A".to_string(), "B".to_string(), "C".to_string()])
        );

        let report = prepared.validate();
        let value = serde_json::to_value(&report).expect("json");
        assert_eq!(
            value["expectedFrequency"]["details"]["originalRowLabels"],
            json!(["Code A", "Code B", "Code C"])
        );
        assert_eq!(value["expectedFrequency"]["details"]["observed"], json!([[20, 20], [0, 0]]));
    }
}
