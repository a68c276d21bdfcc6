use crate::error::{EngineError, Result};
use crate::model::ProjectSnapshot;
use std::collections::HashMap;

/// Read access to project snapshots.
///
/// A project owned by someone other than `owner` is reported as not found.
pub trait ProjectStore: Send + Sync {
    fn load(&self, project_id: &str, owner: Option<&str>) -> Result<ProjectSnapshot>;
}

/// Rejects ids that could escape a store's namespace.
pub fn validate_project_id(project_id: &str) -> Result<&str> {
    let trimmed = project_id.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid_request("projectId is required"));
    }
    if trimmed.contains(['/', '\\']) || trimmed.contains("..") {
        return Err(EngineError::invalid_request(format!(
            "projectId '{trimmed}' contains path characters"
        )));
    }
    Ok(trimmed)
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryProjectStore {
    projects: HashMap<String, ProjectSnapshot>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, project: ProjectSnapshot) {
        self.projects.insert(project.id.clone(), project);
    }
}

impl FromIterator<ProjectSnapshot> for InMemoryProjectStore {
    fn from_iter<I: IntoIterator<Item = ProjectSnapshot>>(iter: I) -> Self {
        let mut store = Self::new();
        for project in iter {
            store.insert(project);
        }
        store
    }
}

impl ProjectStore for InMemoryProjectStore {
    fn load(&self, project_id: &str, owner: Option<&str>) -> Result<ProjectSnapshot> {
        let project_id = validate_project_id(project_id)?;
        self.projects
            .get(project_id)
            .filter(|project| owner.map_or(true, |o| project.is_owned_by(o)))
            .cloned()
            .ok_or_else(|| EngineError::ProjectNotFound(project_id.to_string()))
    }
}
