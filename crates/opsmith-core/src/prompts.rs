//! Prompt construction for every generation stage.
//!
//! All prompt text lives here so the pipelines stay pure control flow.
//! Each builder hard-constrains the answer format the downstream parser
//! expects (a closed tag, a single fenced block, a JSON object).

use crate::domain::{Artifact, ArtifactFormat, ClusterSpec, Diagnostic, Strategy, WorkloadDescriptor};

/// Classifier prompt: closed vocabulary, tag only.
pub fn classify(requirement: &str) -> String {
    format!(
        "You are an AWS ECS expert. Classify the input requirement and output \
        the setup pattern without any additional text or explanations.\n\
        Valid outputs (answer with exactly one tag, nothing else): {tags}\n\
        Input: {requirement}\n\
        Output: ",
        tags = Strategy::known_tags().join(" | "),
    )
}

/// Project identification from a file listing.
pub fn identify_project(file_listing: &str) -> String {
    format!(
        "You are an expert in evaluating a project's file listing. Identify the \
        programming language and the dependency descriptor used by the project. \
        Search the listing recursively for files like pom.xml, go.mod, \
        requirements.txt, package.json, Cargo.toml.\n\n\
        FILES:\n{file_listing}\n\n\
        Respond with a single JSON object inside a ```json fenced block and \
        nothing else. The dependency_object value must be the relative path of \
        the descriptor within the project. Example:\n\
        ```json\n\
        {{\"project_type\": \"java\", \"dependency_object\": \"service/pom.xml\"}}\n\
        ```"
    )
}

/// Stage 1 of the Dockerfile pipeline: derive build facts.
pub fn dockerfile_facts(project_type: &str, manifest_content: &str, file_listing: &str) -> String {
    format!(
        "You are a developer assistant with knowledge of all programming \
        languages. Identify the contents required for a Dockerfile from the \
        information below. Always prefer the latest official base image for \
        the project type (e.g. FROM python:latest).\n\
        project_type: {project_type}\n\
        dependency_descriptor_content:\n{manifest_content}\n\
        project_files:\n{file_listing}\n\n\
        Output plain key/value facts, no explanations:\n\
        base_image, run_instructions, copy_instructions, install_instructions, \
        expose_port, run_as_user, entry_point"
    )
}

/// Stage 2 of the Dockerfile pipeline: produce the Dockerfile body.
pub fn dockerfile(project_type: &str, facts: &str) -> String {
    format!(
        "You are a Dockerfile generation assistant. Generate a Dockerfile \
        following best practices from the details below.\n\
        Project type: {project_type}\n\
        Dockerfile facts:\n{facts}\n\n\
        Rules:\n\
        1. Base the image on the project type; after FROM, add RUN instructions \
        to update the image (apt update -y / yum update -y as appropriate).\n\
        2. Use official toolchain binaries, never wrapper scripts like mvnw.\n\
        3. COPY/ADD source before any compilation instruction; install or build \
        dependencies after the copy.\n\
        4. Clean files not needed at runtime (build caches, module caches for \
        compiled languages).\n\
        5. EXPOSE the application port; set WORKDIR and needed ENV variables.\n\
        6. Create a non-root user, chown the application files to it, and add \
        a USER instruction so the image runs unprivileged.\n\
        7. End with a concrete ENTRYPOINT or CMD, no wildcards in paths.\n\n\
        Output ONLY the Dockerfile inside a single ```dockerfile fenced block, \
        no explanations."
    )
}

/// Cluster-shape stage shared by the Terraform and CloudFormation pipelines.
pub fn cluster_spec(tool: &str, strategy: Strategy, requirement: &str) -> String {
    let extras = match strategy {
        Strategy::Fargate => {
            "3. Number of Fargate tasks required.\n\
             4. CPU and memory per task (e.g. 512 vCPU, 1024 MiB memory).\n"
        }
        Strategy::Ec2Autoscaling => {
            "3. Number of EC2 instances and instance types (e.g. t3.medium).\n\
             4. Autoscaling policy (target tracking, step scaling, desired capacity) \
             and Auto Scaling Group details.\n"
        }
    };
    format!(
        "You are a {tool} expert who generates AWS ECS {strategy} configuration.\n\
        Initial requirement: {requirement}\n\n\
        Provide the following details:\n\
        1. Name of the ECS cluster.\n\
        2. VPC to associate the ECS cluster with.\n\
        {extras}\
        5. Tags to apply to the cluster (key=value, comma separated).\n\
        6. Additional networking requirements (subnets, security groups)."
    )
}

/// Task definition derived from Dockerfile content.
pub fn task_definition(dockerfile_body: &str) -> String {
    format!(
        "Generate an ECS task definition JSON from the Dockerfile content below.\n\
        Dockerfile content:\n{dockerfile_body}\n\n\
        The JSON object must include a `family` name and `containerDefinitions` \
        with name, image, cpu, memory, portMappings, environment, command, \
        workingDirectory, and logConfiguration. Pick the image, port, and other \
        details up from the Dockerfile.\n\n\
        Output ONLY the JSON object inside a single ```json fenced block."
    )
}

const GENERATION_RULES: &str = "\
    1. Do not use hardcoded resource IDs.\n\
    2. Avoid data sources except for region, availability zones, and caller identity.\n\
    3. Generate end-to-end code; the user must not be prompted for extra input.\n\
    4. Build the ECS task definition resource from the task definition JSON.\n\
    5. Avoid cyclic dependencies: define ALB and task security groups separately \
    and use explicit dependency attributes where ordering matters.\n\
    6. Include all networking components: custom VPC, subnets, IGW, security groups.\n\
    7. Create the IAM roles for task and task execution with least-privilege policies.\n\
    8. Create an Application Load Balancer with listeners and target groups \
    routing to the ECS service.\n\
    9. Do not reference undeclared variables or resources.\n";

/// Final Terraform stage.
pub fn terraform(cluster: &ClusterSpec, workload: &WorkloadDescriptor) -> String {
    let asg_note = match cluster.strategy {
        Strategy::Fargate => "",
        Strategy::Ec2Autoscaling => {
            "10. Include the Auto Scaling Group configuration for the EC2 \
             instances, plus the NAT gateway the private subnets need.\n"
        }
    };
    format!(
        "Based on all the details provided:\n\
        ECS cluster details:\n{details}\n\
        Task definition JSON:\n{task_json}\n\n\
        Generate reusable Terraform configuration for ECS {strategy} and its \
        dependent resources, with comments for clarity.\n\n\
        Note:\n{rules}{asg_note}\n\
        The output must be enclosed in a single triple-backtick block with the \
        'hcl' marker and contain nothing else.",
        details = cluster.details,
        task_json = workload.raw,
        strategy = cluster.strategy,
        rules = GENERATION_RULES,
    )
}

/// Final CloudFormation stage (Fargate only).
pub fn cloudformation(cluster: &ClusterSpec, workload: &WorkloadDescriptor) -> String {
    format!(
        "Based on all the details provided:\n\
        ECS cluster details:\n{details}\n\
        Task definition JSON:\n{task_json}\n\n\
        Generate a CloudFormation template for ECS Fargate and its dependent \
        resources, with comments for clarity.\n\n\
        Note:\n{rules}\
        10. Create a standard end-to-end template for one environment only.\n\
        11. Avoid Conditions unless required.\n\n\
        The output must be YAML enclosed in a single triple-backtick block with \
        the 'yaml' marker and contain nothing else.",
        details = cluster.details,
        task_json = workload.raw,
        rules = GENERATION_RULES,
    )
}

/// Single review pass over a generated CloudFormation template.
pub fn cloudformation_review(template_body: &str) -> String {
    format!(
        "You are a CloudFormation expert. Analyze the following template:\n\n\
        {template_body}\n\n\
        If there are errors or improvements to be made, provide a corrected \
        version of the entire template. If no changes are needed, return the \
        original template unchanged.\n\n\
        The output must be YAML enclosed in triple backticks with the 'yaml' \
        marker, with no text outside the code block."
    )
}

/// CodeBuild buildspec from Dockerfile content and ECR coordinates.
pub fn buildspec(
    dockerfile_body: &str,
    runtime_version: &str,
    ecr_repository_name: &str,
    ecr_repository_uri: &str,
) -> String {
    format!(
        "You are an AWS CodeBuild expert. Generate a buildspec.yaml for \
        building, tagging, and pushing a Docker image to Amazon ECR from the \
        provided Dockerfile content and repository details, including clone \
        steps as a prerequisite.\n\n\
        Dockerfile content:\n{dockerfile_body}\n\
        ECR repository name: {ecr_repository_name}\n\
        ECR repository URI: {ecr_repository_uri}\n\
        Runtime to declare under install.runtime-versions: {runtime_version}\n\n\
        Use buildspec version 0.2 with install, pre_build (ECR login via \
        `aws ecr get-login-password`), build (docker build tagged with \
        $CODEBUILD_RESOLVED_SOURCE_VERSION), and post_build (docker push) \
        phases, following AWS security best practices.\n\n\
        The output must be YAML enclosed in triple backticks with the 'yaml' \
        marker, with no text outside the code block."
    )
}

/// Repair prompt: prior artifact + the diagnostic that rejected it.
///
/// Scenario contract: the diagnostic message is embedded verbatim so the
/// model sees exactly what the tool reported.
pub fn repair(artifact: &Artifact, diagnostic: &Diagnostic) -> String {
    let what = match artifact.format {
        ArtifactFormat::Dockerfile => "Dockerfile",
        ArtifactFormat::TerraformHcl => "Terraform configuration",
        ArtifactFormat::CloudFormationYaml => "CloudFormation template",
        ArtifactFormat::BuildspecYaml => "CodeBuild buildspec",
    };
    format!(
        "You are an expert in fixing issues in a {what} raised during {stage}.\n\
        The following error was reported:\n{message}\n\n\
        Current {what} content:\n{body}\n\n\
        Update the content with an appropriate fix and return the complete \
        corrected {what}, enclosed in a single triple-backtick block with the \
        '{marker}' marker and no explanation outside it.",
        stage = diagnostic.stage,
        message = diagnostic.message,
        body = artifact.body,
        marker = artifact.format.marker(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactFormat;

    #[test]
    fn test_classify_lists_closed_vocabulary() {
        let p = classify("two tasks behind an ALB");
        assert!(p.contains("fargate | ec2-autoscaling"));
        assert!(p.contains("two tasks behind an ALB"));
    }

    #[test]
    fn test_repair_embeds_diagnostic_verbatim() {
        let artifact = Artifact::new(ArtifactFormat::TerraformHcl, "resource {}");
        let diag = Diagnostic::new("terraform_plan", "port 8080 already bound");
        let p = repair(&artifact, &diag);
        assert!(p.contains("port 8080 already bound"));
        assert!(p.contains("resource {}"));
        assert!(p.contains("'hcl'"));
    }

    #[test]
    fn test_cluster_spec_varies_by_strategy() {
        let fargate = cluster_spec("Terraform", Strategy::Fargate, "req");
        let ec2 = cluster_spec("Terraform", Strategy::Ec2Autoscaling, "req");
        assert!(fargate.contains("Fargate tasks"));
        assert!(ec2.contains("Auto Scaling Group"));
    }

    #[test]
    fn test_final_stage_prompts_request_their_fence() {
        let cluster = ClusterSpec::from_stage_output(Strategy::Fargate, "cluster: web").unwrap();
        let workload = WorkloadDescriptor::parse(
            r#"{"family": "web", "containerDefinitions": []}"#,
        )
        .unwrap();
        assert!(terraform(&cluster, &workload).contains("'hcl'"));
        assert!(cloudformation(&cluster, &workload).contains("'yaml'"));
    }
}
