use anyhow::{Context as AnyhowContext, Result};
use qualstat_engine::{validate_project_id, EngineError, ProjectSnapshot, ProjectStore};
use std::path::{Path, PathBuf};

/// Project snapshots stored as `<root>/<projectId>.json`.
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    root: PathBuf,
}

impl FileProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ProjectStore for FileProjectStore {
    fn load(&self, project_id: &str, owner: Option<&str>) -> qualstat_engine::Result<ProjectSnapshot> {
        let project_id = validate_project_id(project_id)?;
        let path = self.root.join(format!("{project_id}.json"));
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::ProjectNotFound(project_id.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let mut project: ProjectSnapshot = serde_json::from_str(&raw)?;
        if project.id.is_empty() {
            project.id = project_id.to_string();
        }
        if let Some(owner) = owner {
            if !project.is_owned_by(owner) {
                log::debug!("project {project_id} requested by non-owner");
                return Err(EngineError::ProjectNotFound(project_id.to_string()));
            }
        }
        log::debug!(
            "loaded project {project_id}: {} codes, {} documents, {} segments",
            project.code_definitions.len(),
            project.imported_files.len(),
            project.coded_segments.len()
        );
        Ok(project)
    }
}

/// Read one snapshot file directly (command-line use).
pub fn load_snapshot(path: &Path) -> Result<ProjectSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid project snapshot {}", path.display()))
}
