use crate::ids::{normalize_id, normalize_opt};
use qualstat_protocol::EntityRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named qualitative category that can be applied to text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeDefinition {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityRef,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An imported document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityRef,
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// One application of a code to a span of a document (a coded segment).
///
/// Only document and code membership matter for frequency tables; the offsets
/// are carried for completeness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<EntityRef>,
    #[serde(default)]
    pub file_id: Option<EntityRef>,
    #[serde(default, alias = "codeDefinitionRef")]
    pub code_definition: Option<EntityRef>,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
}

impl AnnotationRecord {
    pub fn document_id(&self) -> Option<String> {
        normalize_opt(self.file_id.as_ref())
    }

    pub fn code_id(&self) -> Option<String> {
        normalize_opt(self.code_definition.as_ref())
    }
}

/// Read-only view of one project, as loaded from the project store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub code_definitions: Vec<CodeDefinition>,
    #[serde(default)]
    pub coded_segments: Vec<AnnotationRecord>,
    #[serde(default)]
    pub imported_files: Vec<Document>,
}

impl ProjectSnapshot {
    /// Code id → code name.
    pub fn code_names(&self) -> HashMap<String, &str> {
        self.code_definitions
            .iter()
            .filter_map(|code| normalize_id(&code.id).map(|id| (id, code.name.as_str())))
            .collect()
    }

    /// Document id → document name.
    pub fn document_names(&self) -> HashMap<String, &str> {
        self.imported_files
            .iter()
            .filter_map(|doc| normalize_id(&doc.id).map(|id| (id, doc.name.as_str())))
            .collect()
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.as_deref().map_or(true, |o| o == owner)
    }
}
