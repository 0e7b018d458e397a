//! Project inspection: file listing and gateway-backed identification.

use std::path::Path;
use std::sync::Arc;

use crate::domain::{
    DependencyManifest, OpsmithError, ProjectFacts, ProjectProfile, Result,
};
use crate::extract::extract_fenced;
use crate::gateway::TextGateway;
use crate::prompts;

/// Directories never worth showing to the identification call.
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".idea",
    ".venv",
    "venv",
    "node_modules",
    "target",
    "__pycache__",
    ".terraform",
];

/// Recursively list a project tree as sorted, slash-separated relative
/// paths joined by newlines.
pub fn list_project_files(root: &Path) -> Result<String> {
    if !root.is_dir() {
        return Err(OpsmithError::Precondition(format!(
            "project root {} is not a directory",
            root.display()
        )));
    }
    let mut paths = Vec::new();
    walk(root, root, &mut paths)?;
    paths.sort();
    Ok(paths.join("\n"))
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if path.is_dir() {
            if !SKIPPED_DIRS.contains(&name.as_str()) {
                walk(root, &path, out)?;
            }
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

/// Infers project facts (language, dependency descriptor) from the file
/// listing via a single gateway call.
pub struct ProjectIdentifier {
    gateway: Arc<dyn TextGateway>,
}

impl ProjectIdentifier {
    pub fn new(gateway: Arc<dyn TextGateway>) -> Self {
        Self { gateway }
    }

    /// Build the full profile for `project_root`: listing, inferred facts,
    /// and the loaded dependency manifest.
    ///
    /// A manifest path the gateway names but that does not exist on disk is
    /// a fatal precondition failure.
    pub async fn profile(&self, project_root: &Path) -> Result<ProjectProfile> {
        let file_listing = list_project_files(project_root)?;
        let facts = self.identify(&file_listing).await?;
        let manifest = DependencyManifest::load(&project_root.join(&facts.dependency_object))?;

        tracing::info!(
            project_type = %facts.project_type,
            dependency_object = %facts.dependency_object,
            "project identified"
        );

        Ok(ProjectProfile {
            facts,
            manifest,
            file_listing,
        })
    }

    async fn identify(&self, file_listing: &str) -> Result<ProjectFacts> {
        let response = self
            .gateway
            .invoke(&prompts::identify_project(file_listing))
            .await?;
        let json = extract_fenced(&response, "json")?;
        serde_json::from_str(&json).map_err(|e| OpsmithError::GenerationStage {
            stage: "identify_project".to_string(),
            reason: format!("malformed project facts: {e}"),
        })
    }
}
