//! Run inputs: the requirement and the project's dependency manifest.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::error::{OpsmithError, Result};

/// Free-text description of the desired infrastructure. Immutable input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement(String);

impl Requirement {
    /// Construct a requirement. Empty or whitespace-only text is a fatal
    /// precondition failure.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(OpsmithError::Precondition(
                "requirement text is empty".to_string(),
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw content of a project's dependency descriptor (pom.xml,
/// requirements.txt, go.mod, ...). Immutable input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyManifest {
    /// Path the manifest was read from.
    pub path: PathBuf,

    /// Raw file content.
    pub content: String,
}

impl DependencyManifest {
    /// Load a manifest from disk. A missing file is a fatal precondition
    /// failure, not something the repair loop retries.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(OpsmithError::Precondition(format!(
                "dependency manifest not found at {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Directory containing the manifest; generated Dockerfiles land here.
    pub fn parent_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Facts about a project inferred by the identification call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectFacts {
    /// Primary language/ecosystem, e.g. "java", "python", "go".
    pub project_type: String,

    /// Relative path of the dependency descriptor within the project.
    pub dependency_object: String,
}

/// Everything the Dockerfile pipeline needs about one project.
#[derive(Debug, Clone)]
pub struct ProjectProfile {
    pub facts: ProjectFacts,
    pub manifest: DependencyManifest,

    /// Newline-joined relative file paths of the project tree.
    pub file_listing: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_requirement_rejects_empty() {
        assert!(Requirement::new("").is_err());
        assert!(Requirement::new("   \n\t").is_err());
        assert!(Requirement::new("two fargate tasks behind an ALB").is_ok());
    }

    #[test]
    fn test_manifest_load_missing_is_precondition() {
        let err = DependencyManifest::load(Path::new("/nonexistent/pom.xml")).unwrap_err();
        assert!(matches!(err, OpsmithError::Precondition(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_manifest_load_and_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "flask==3.0.0").unwrap();

        let manifest = DependencyManifest::load(&path).unwrap();
        assert!(manifest.content.contains("flask"));
        assert_eq!(manifest.parent_dir(), dir.path());
    }
}
