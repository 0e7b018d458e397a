//! Fenced code block extraction.
//!
//! The single place where free model text is parsed into an [`Artifact`].
//! Format drift in generated text surfaces here as a hard error instead of
//! leaking malformed prose into validators.

use regex::Regex;

use crate::domain::{Artifact, ArtifactFormat, OpsmithError, Result};

/// Extract the fenced region(s) tagged `marker` from `raw`.
///
/// Policy:
/// - exactly one block: its trimmed body.
/// - multiple blocks: trimmed bodies concatenated in appearance order,
///   joined by a blank line (never silently pick one).
/// - zero blocks: [`OpsmithError::MissingFence`] — never an empty artifact
///   disguised as success.
/// - blocks present but all bodies empty: [`OpsmithError::EmptyArtifact`].
pub fn extract_fenced(raw: &str, marker: &str) -> Result<String> {
    // (?s) so bodies may span lines; marker is matched case-insensitively
    // since models fence with both ```hcl and ```HCL.
    let pattern = format!(r"(?si)```{}[ \t]*\r?\n(.*?)```", regex::escape(marker));
    let re = Regex::new(&pattern).expect("fence pattern is valid");

    let blocks: Vec<&str> = re
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .collect();

    if blocks.is_empty() {
        return Err(OpsmithError::MissingFence {
            marker: marker.to_string(),
        });
    }

    let body = blocks
        .iter()
        .filter(|b| !b.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n\n");

    if body.is_empty() {
        return Err(OpsmithError::EmptyArtifact {
            marker: marker.to_string(),
        });
    }

    Ok(body)
}

/// Extract an [`Artifact`] of the given format from raw model output.
pub fn extract_artifact(raw: &str, format: ArtifactFormat) -> Result<Artifact> {
    let body = extract_fenced(raw, format.marker())?;
    Ok(Artifact::new(format, body))
}
