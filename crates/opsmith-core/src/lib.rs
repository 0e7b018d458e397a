//! Opsmith Core Library
//!
//! Model-assisted generation of deployment artifacts (Dockerfiles,
//! Terraform, CloudFormation, CodeBuild buildspecs), validated against the
//! real tooling inside a bounded generate-validate-repair loop.

pub mod classify;
pub mod domain;
pub mod extract;
pub mod gateway;
pub mod generate;
pub mod obs;
pub mod persist;
pub mod project;
pub mod prompts;
pub mod repair;
pub mod telemetry;
pub mod validate;

pub use classify::Classifier;

pub use domain::{
    Artifact, ArtifactFormat, ClusterSpec, DependencyManifest, Diagnostic, GatewayError,
    OpsmithError, ProjectFacts, ProjectProfile, Requirement, Result, Strategy, WorkloadDescriptor,
};

pub use extract::{extract_artifact, extract_fenced};

pub use gateway::{AnthropicGateway, ScriptedGateway, TextGateway};

pub use generate::{
    ArtifactSource, BuildspecGenerator, CloudFormationGenerator, DockerfileGenerator,
    TerraformGenerator,
};

pub use persist::{read_report, write_artifact, write_report, ContentDigest};

pub use project::{list_project_files, ProjectIdentifier};

pub use repair::{CancelToken, LoopOutcome, LoopPolicy, LoopReport, RepairLoop, Transition};

pub use telemetry::init_tracing;

pub use validate::{
    ArtifactValidator, DockerValidator, ScriptedValidator, TerraformValidator, Verdict,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
