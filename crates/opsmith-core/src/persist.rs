//! Artifact and run-report persistence.
//!
//! Artifacts are written verbatim to caller-chosen paths. Run reports are
//! written per run id with a SHA-256 digest sidecar so a later reader can
//! detect tampering or truncation.

use std::path::{Path, PathBuf};

use sha2::Sha256;

use crate::domain::{Artifact, OpsmithError, Result};
use crate::repair::LoopReport;

/// Hex-encoded SHA-256 of a byte string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write the artifact body verbatim to `path`, creating parent directories.
///
/// If `path` is a directory, the format's conventional filename is used
/// (`Dockerfile`, `main.tf`, ...). Returns the path actually written.
pub fn write_artifact(artifact: &Artifact, path: &Path) -> Result<PathBuf> {
    let target = if path.is_dir() {
        path.join(artifact.format.default_filename())
    } else {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        path.to_path_buf()
    };
    std::fs::write(&target, &artifact.body)?;
    tracing::info!(path = %target.display(), format = %artifact.format, "artifact written");
    Ok(target)
}

/// Persist `<dir>/<run_id>/report.json` and `<dir>/<run_id>/report.digest`.
pub fn write_report(report: &LoopReport, dir: &Path) -> Result<PathBuf> {
    let run_dir = dir.join(report.run_id.to_string());
    std::fs::create_dir_all(&run_dir)?;

    let report_path = run_dir.join("report.json");
    let digest_path = run_dir.join("report.digest");
    let json = serde_json::to_vec_pretty(report)?;
    let digest = ContentDigest::from_bytes(&json);

    std::fs::write(&report_path, &json)?;
    std::fs::write(&digest_path, digest.as_str().as_bytes())?;

    Ok(report_path)
}

/// Read and verify `<dir>/<run_id>/report.json` integrity.
pub fn read_report(run_id: &str, dir: &Path) -> Result<LoopReport> {
    let run_dir = dir.join(run_id);
    let json = std::fs::read(run_dir.join("report.json"))?;
    let stored = std::fs::read_to_string(run_dir.join("report.digest"))?;
    let actual = ContentDigest::from_bytes(&json);

    if stored.trim() != actual.as_str() {
        return Err(OpsmithError::DigestMismatch {
            expected: stored.trim().to_string(),
            actual: actual.as_str().to_string(),
        });
    }

    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactFormat;
    use crate::repair::{LoopOutcome, LoopPolicy, LoopReport};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_report() -> LoopReport {
        LoopReport {
            run_id: Uuid::new_v4(),
            policy: LoopPolicy::default(),
            outcome: LoopOutcome::Validated,
            attempts_used: 2,
            validations: 3,
            artifact: Some(Artifact::new(ArtifactFormat::Dockerfile, "FROM alpine")),
            last_diagnostic: None,
            history: vec![Artifact::new(ArtifactFormat::Dockerfile, "FRM alpine")],
            transitions: Vec::new(),
            duration_ms: 1234,
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_artifact_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(ArtifactFormat::TerraformHcl, "resource \"x\" \"y\" {}\n");
        let path = write_artifact(&artifact, &dir.path().join("infra/main.tf")).unwrap();
        assert!(path.ends_with("infra/main.tf"));
        let body = std::fs::read_to_string(path).unwrap();
        assert_eq!(body, artifact.body);
    }

    #[test]
    fn test_directory_target_uses_conventional_filename() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(ArtifactFormat::Dockerfile, "FROM alpine");
        let path = write_artifact(&artifact, dir.path()).unwrap();
        assert!(path.ends_with("Dockerfile"));
    }

    #[test]
    fn test_report_round_trip_with_digest() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        write_report(&report, dir.path()).unwrap();

        let back = read_report(&report.run_id.to_string(), dir.path()).unwrap();
        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.attempts_used, 2);
        assert_eq!(back.history.len(), 1);
    }

    #[test]
    fn test_tampered_report_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let path = write_report(&report, dir.path()).unwrap();

        let mut json = std::fs::read_to_string(&path).unwrap();
        json = json.replace("\"attempts_used\": 2", "\"attempts_used\": 0");
        std::fs::write(&path, json).unwrap();

        let err = read_report(&report.run_id.to_string(), dir.path()).unwrap_err();
        assert!(matches!(err, OpsmithError::DigestMismatch { .. }));
    }
}
