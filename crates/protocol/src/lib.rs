use anyhow::Result;
use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub mod groups;

pub use groups::{DocGroup, DocGroups};

/// The only test family the preparation engine accepts.
pub const TEST_TYPE_CHI_SQUARE: &str = "chi-square";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ChiSquareSubtype {
    GoodnessOfFit,
    Independence,
    Homogeneity,
    FishersExact,
}

impl ChiSquareSubtype {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GoodnessOfFit => "goodness-of-fit",
            Self::Independence => "independence",
            Self::Homogeneity => "homogeneity",
            Self::FishersExact => "fishers-exact",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "goodness-of-fit" => Some(Self::GoodnessOfFit),
            "independence" => Some(Self::Independence),
            "homogeneity" => Some(Self::Homogeneity),
            "fishers-exact" => Some(Self::FishersExact),
            _ => None,
        }
    }

    pub fn is_contingency(self) -> bool {
        !matches!(self, Self::GoodnessOfFit)
    }
}

/// Reference to a code or document as it arrives from the project store: a bare
/// id (string or number) or an embedded snapshot object carrying `_id`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, JsonSchema)]
#[serde(transparent)]
pub struct EntityRef(pub serde_json::Value);

impl From<&str> for EntityRef {
    fn from(value: &str) -> Self {
        Self(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for EntityRef {
    fn from(value: String) -> Self {
        Self(serde_json::Value::String(value))
    }
}

impl From<serde_json::Value> for EntityRef {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    Uniform,
    Custom,
}

/// Target distribution for a goodness-of-fit test. Custom proportions are
/// percentages (0-100) keyed by code id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Distribution {
    #[serde(rename = "type")]
    pub kind: DistributionKind,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_percentages"
    )]
    #[schemars(with = "Option<BTreeMap<String, f64>>")]
    pub proportions: Option<BTreeMap<String, f64>>,
}

/// A percentage sent either as a number or as numeric text (`"50"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum Percentage {
    Number(f64),
    Text(String),
}

fn deserialize_percentages<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<BTreeMap<String, f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<BTreeMap<String, Percentage>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    raw.into_iter()
        .map(|(code, value)| {
            let percent = match value {
                Percentage::Number(number) => number,
                Percentage::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                    <D::Error as de::Error>::custom(format!(
                        "proportion for '{code}' is not a number: \"{text}\""
                    ))
                })?,
            };
            Ok::<_, D::Error>((code, percent))
        })
        .collect::<std::result::Result<_, D::Error>>()
        .map(Some)
}

impl Distribution {
    pub fn uniform() -> Self {
        Self {
            kind: DistributionKind::Uniform,
            proportions: None,
        }
    }

    /// Percentage assigned to `code_id`; codes without an entry get 0.
    pub fn proportion_for(&self, code_id: &str) -> f64 {
        self.proportions
            .as_ref()
            .and_then(|p| p.get(code_id))
            .copied()
            .unwrap_or(0.0)
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Self::uniform()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeCombination {
    pub new_name: String,
    #[serde(default)]
    pub original_code_ids: Vec<EntityRef>,
}

/// Inbound test-preparation request.
#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub test_type: String,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub validate_only: bool,

    #[serde(default)]
    pub codes: Vec<EntityRef>,
    #[serde(default)]
    pub doc_list: Vec<EntityRef>,

    #[serde(default)]
    pub indep_codes: Vec<EntityRef>,
    #[serde(default)]
    pub indep_docs: Vec<EntityRef>,

    #[serde(default)]
    pub homo_codes: Vec<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<BTreeMap<String, Vec<EntityRef>>>")]
    pub homo_doc_groups: Option<DocGroups>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_combinations: Vec<CodeCombination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
}

/// Prepared table in the shape the numeric service reads.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum PayloadTable {
    #[serde(rename_all = "camelCase")]
    Vector {
        observed: Vec<u64>,
        codes: Vec<String>,
        category_labels: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Matrix {
        observed: Vec<Vec<u64>>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
    },
}

/// Outbound request to the numeric computation service.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    pub test_type: String,
    pub subtype: String,
    #[serde(flatten)]
    pub table: PayloadTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

pub fn test_request_schema() -> Result<serde_json::Value> {
    let schema = schemars::schema_for!(TestRequest);
    serde_json::to_value(schema).map_err(Into::into)
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
