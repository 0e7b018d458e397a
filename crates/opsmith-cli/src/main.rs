//! Opsmith - model-assisted deployment artifact generation CLI
//!
//! ## Commands
//!
//! - `dockerfile`: Generate and validate a Dockerfile for a project
//! - `terraform`: Generate and validate Terraform for an ECS deployment
//! - `cloudformation`: Generate a reviewed CloudFormation template (Fargate only)
//! - `buildspec`: Generate a CodeBuild buildspec for an ECR push

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use opsmith_core::{
    persist, AnthropicGateway, ArtifactSource, BuildspecGenerator, CancelToken, Classifier,
    CloudFormationGenerator, DockerValidator, DockerfileGenerator, LoopOutcome, LoopPolicy,
    LoopReport, ProjectIdentifier, RepairLoop, Requirement, TerraformGenerator,
    TerraformValidator, TextGateway,
};

#[derive(Parser)]
#[command(name = "opsmith")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate validated deployment artifacts from project context", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Anthropic API key
    #[arg(long, global = true, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model override
    #[arg(long, global = true, env = "OPSMITH_MODEL")]
    model: Option<String>,

    /// Repair attempts tolerated before a run is abandoned
    #[arg(long, global = true, default_value_t = 10)]
    max_repair_attempts: u32,

    /// Directory for run reports (report.json + digest per run)
    #[arg(long, global = true, default_value = ".opsmith/runs")]
    reports_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Dockerfile for a project and validate it with docker
    Dockerfile {
        /// Project root directory
        #[arg(default_value = ".")]
        project: PathBuf,

        /// Output path (default: Dockerfile next to the dependency manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the post-build smoke run
        #[arg(long)]
        no_smoke_run: bool,
    },

    /// Generate Terraform for an ECS deployment, validated with terraform plan
    Terraform {
        /// Infrastructure requirement, free text
        requirement: String,

        /// Path to the Dockerfile describing the workload
        #[arg(short, long, default_value = "Dockerfile")]
        dockerfile: PathBuf,

        /// Output path for main.tf
        #[arg(short, long, default_value = "main.tf")]
        output: PathBuf,
    },

    /// Generate a CloudFormation template (Fargate only, with review pass)
    Cloudformation {
        /// Infrastructure requirement, free text
        requirement: String,

        /// Path to the Dockerfile describing the workload
        #[arg(short, long, default_value = "Dockerfile")]
        dockerfile: PathBuf,

        /// Output path for the template
        #[arg(short, long, default_value = "template.yaml")]
        output: PathBuf,
    },

    /// Generate a CodeBuild buildspec for building and pushing to ECR
    Buildspec {
        /// Path to the Dockerfile describing the build
        #[arg(short, long, default_value = "Dockerfile")]
        dockerfile: PathBuf,

        /// ECR repository name
        #[arg(long)]
        ecr_repository_name: String,

        /// ECR repository URI
        #[arg(long)]
        ecr_repository_uri: String,

        /// Output path for buildspec.yaml
        #[arg(short, long, default_value = "buildspec.yaml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    opsmith_core::init_tracing(cli.json, level);

    let gateway = build_gateway(&cli)?;
    let cancel = install_cancel_handler();
    let policy = LoopPolicy {
        max_repair_attempts: cli.max_repair_attempts,
    };

    match &cli.command {
        Commands::Dockerfile {
            project,
            output,
            no_smoke_run,
        } => {
            cmd_dockerfile(
                &cli, gateway, cancel, policy, project, output.as_deref(), *no_smoke_run,
            )
            .await
        }
        Commands::Terraform {
            requirement,
            dockerfile,
            output,
        } => cmd_terraform(&cli, gateway, cancel, policy, requirement, dockerfile, output).await,
        Commands::Cloudformation {
            requirement,
            dockerfile,
            output,
        } => cmd_cloudformation(gateway, requirement, dockerfile, output).await,
        Commands::Buildspec {
            dockerfile,
            ecr_repository_name,
            ecr_repository_uri,
            output,
        } => {
            cmd_buildspec(
                gateway,
                dockerfile,
                ecr_repository_name,
                ecr_repository_uri,
                output,
            )
            .await
        }
    }
}

fn build_gateway(cli: &Cli) -> Result<Arc<dyn TextGateway>> {
    let gateway = match &cli.api_key {
        Some(key) => AnthropicGateway::new(key.clone()),
        None => AnthropicGateway::from_env().context("no API key configured")?,
    };
    let gateway = match &cli.model {
        Some(model) => gateway.with_model(model.clone()),
        None => gateway,
    };
    Ok(Arc::new(gateway))
}

/// First ctrl-c raises the token so the loop stops between attempts.
fn install_cancel_handler() -> CancelToken {
    let token: CancelToken = Arc::new(AtomicBool::new(false));
    let handle = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing current attempt");
            handle.store(true, Ordering::SeqCst);
        }
    });
    token
}

async fn cmd_dockerfile(
    cli: &Cli,
    gateway: Arc<dyn TextGateway>,
    cancel: CancelToken,
    policy: LoopPolicy,
    project: &PathBuf,
    output: Option<&std::path::Path>,
    no_smoke_run: bool,
) -> Result<()> {
    let profile = ProjectIdentifier::new(gateway.clone())
        .profile(project)
        .await
        .context("project identification failed")?;

    let context_dir = profile.manifest.parent_dir();
    let target = output
        .map(PathBuf::from)
        .unwrap_or_else(|| context_dir.clone());

    let mut validator = DockerValidator::new(&context_dir);
    if no_smoke_run {
        validator = validator.without_smoke_run();
    }

    let generator = DockerfileGenerator::new(gateway, profile);
    let report = RepairLoop::new(Arc::new(validator))
        .with_policy(policy)
        .with_cancel_token(cancel)
        .run(&generator)
        .await
        .context("dockerfile generation failed")?;

    finish_run(cli, report, &target)
}

async fn cmd_terraform(
    cli: &Cli,
    gateway: Arc<dyn TextGateway>,
    cancel: CancelToken,
    policy: LoopPolicy,
    requirement: &str,
    dockerfile: &PathBuf,
    output: &PathBuf,
) -> Result<()> {
    let requirement = Requirement::new(requirement)?;
    let dockerfile_body = std::fs::read_to_string(dockerfile)
        .with_context(|| format!("reading {}", dockerfile.display()))?;

    let strategy = Classifier::new(gateway.clone()).classify(&requirement).await?;
    info!(strategy = %strategy, "requirement classified");

    let generator = TerraformGenerator::new(gateway, strategy, requirement, dockerfile_body);
    let report = RepairLoop::new(Arc::new(TerraformValidator::new()))
        .with_policy(policy)
        .with_cancel_token(cancel)
        .run(&generator)
        .await
        .context("terraform generation failed")?;

    finish_run(cli, report, output)
}

async fn cmd_cloudformation(
    gateway: Arc<dyn TextGateway>,
    requirement: &str,
    dockerfile: &PathBuf,
    output: &PathBuf,
) -> Result<()> {
    let requirement = Requirement::new(requirement)?;
    let dockerfile_body = std::fs::read_to_string(dockerfile)
        .with_context(|| format!("reading {}", dockerfile.display()))?;

    let strategy = Classifier::new(gateway.clone()).classify(&requirement).await?;
    info!(strategy = %strategy, "requirement classified");

    // No local tool validates CloudFormation; the reviewed draft is final.
    let generator = CloudFormationGenerator::new(gateway, strategy, requirement, dockerfile_body)?;
    let artifact = generator.draft().await?;
    let written = persist::write_artifact(&artifact, output)?;
    println!("wrote {}", written.display());
    Ok(())
}

async fn cmd_buildspec(
    gateway: Arc<dyn TextGateway>,
    dockerfile: &PathBuf,
    ecr_repository_name: &str,
    ecr_repository_uri: &str,
    output: &PathBuf,
) -> Result<()> {
    let dockerfile_body = std::fs::read_to_string(dockerfile)
        .with_context(|| format!("reading {}", dockerfile.display()))?;

    let generator = BuildspecGenerator::new(
        gateway,
        dockerfile_body,
        ecr_repository_name,
        ecr_repository_uri,
    );
    let artifact = generator.draft().await?;
    let written = persist::write_artifact(&artifact, output)?;
    println!("wrote {}", written.display());
    Ok(())
}

/// Persist the report, write the artifact on success, and set the exit status.
fn finish_run(cli: &Cli, report: LoopReport, target: &std::path::Path) -> Result<()> {
    let report_path = persist::write_report(&report, &cli.reports_dir)
        .context("persisting run report")?;
    info!(report = %report_path.display(), "run report written");

    match report.outcome {
        LoopOutcome::Validated => {
            let artifact = report
                .artifact
                .as_ref()
                .context("validated run carried no artifact")?;
            let written = persist::write_artifact(artifact, target)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "run_id": report.run_id,
                        "outcome": report.outcome,
                        "attempts_used": report.attempts_used,
                        "validations": report.validations,
                        "artifact_path": written,
                    })
                );
            } else {
                println!(
                    "validated after {} repair attempt(s): {}",
                    report.attempts_used,
                    written.display()
                );
            }
            Ok(())
        }
        LoopOutcome::Exhausted => {
            if let Some(diag) = &report.last_diagnostic {
                eprintln!("last failure ({}):\n{}", diag.stage, diag.message);
            }
            anyhow::bail!(
                "gave up after {} repair attempts; report at {}",
                report.attempts_used,
                report_path.display()
            )
        }
        LoopOutcome::Cancelled => anyhow::bail!("run cancelled"),
    }
}
