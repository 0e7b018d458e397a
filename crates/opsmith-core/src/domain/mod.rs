//! Domain types for Opsmith runs.

pub mod artifact;
pub mod error;
pub mod project;
pub mod strategy;
pub mod workload;

pub use artifact::{Artifact, ArtifactFormat, Diagnostic};
pub use error::{GatewayError, OpsmithError, Result};
pub use project::{DependencyManifest, ProjectFacts, ProjectProfile, Requirement};
pub use strategy::Strategy;
pub use workload::{ClusterSpec, WorkloadDescriptor};
