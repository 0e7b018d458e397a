//! End-to-end loop scenarios driving real pipelines over scripted seams.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use opsmith_core::{
    ArtifactFormat, CancelToken, LoopOutcome, RepairLoop, Requirement, ScriptedGateway,
    ScriptedValidator, Strategy, TerraformGenerator,
};

const TASK_DEF_JSON: &str = r#"```json
{
  "family": "web-app",
  "containerDefinitions": [
    {"name": "web", "image": "web-app:latest", "portMappings": [{"containerPort": 8080}]}
  ]
}
```"#;

fn terraform_generator(gateway: Arc<ScriptedGateway>) -> TerraformGenerator {
    TerraformGenerator::new(
        gateway,
        Strategy::Fargate,
        Requirement::new("containerized web app on a serverless cluster").unwrap(),
        "FROM python:3.12\nCOPY . .\nCMD [\"python\", \"app.py\"]",
    )
}

#[tokio::test]
async fn first_attempt_pass_skips_repair_entirely() {
    let gateway = Arc::new(ScriptedGateway::with_responses([
        "cluster name web-cluster, two tasks, ALB on 443",
        TASK_DEF_JSON,
        "```hcl\nresource \"aws_ecs_cluster\" \"web\" {\n  name = \"web-cluster\"\n}\n```",
    ]));
    let validator = Arc::new(ScriptedValidator::new());

    let report = RepairLoop::new(validator.clone())
        .run(&terraform_generator(gateway.clone()))
        .await
        .unwrap();

    assert_eq!(report.outcome, LoopOutcome::Validated);
    assert_eq!(report.attempts_used, 0);
    assert_eq!(report.validations, 1);
    // Three pipeline stages, zero repair prompts.
    assert_eq!(gateway.call_count(), 3);
    assert!(report
        .artifact
        .unwrap()
        .body
        .contains("aws_ecs_cluster"));
}

#[tokio::test]
async fn repair_prompt_embeds_prior_diagnostic_verbatim() {
    let plan_error = "Error: Reference to undeclared resource aws_lb.web on main.tf line 14";
    let gateway = Arc::new(ScriptedGateway::with_responses([
        "cluster details",
        TASK_DEF_JSON,
        "```hcl\nbroken first draft\n```",
        "```hcl\nsecond draft\n```",
        "```hcl\nthird draft\n```",
        "```hcl\nfourth draft\n```",
    ]));
    let validator = Arc::new(ScriptedValidator::failing_first(3, "terraform_plan", plan_error));

    let report = RepairLoop::new(validator.clone())
        .run(&terraform_generator(gateway.clone()))
        .await
        .unwrap();

    assert_eq!(report.outcome, LoopOutcome::Validated);
    assert_eq!(report.attempts_used, 3);
    assert_eq!(report.validations, 4);
    assert_eq!(report.artifact.unwrap().body, "fourth draft");

    // Call 4 is the first repair: it must carry the rejected body and the
    // exact tool error text.
    let prompts = gateway.prompts();
    assert_eq!(prompts.len(), 6);
    assert!(prompts[3].contains("broken first draft"));
    assert!(prompts[3].contains(plan_error));

    // The validator saw every draft in order.
    let seen = validator.seen();
    assert_eq!(seen[0].body, "broken first draft");
    assert_eq!(seen[3].body, "fourth draft");
    assert!(seen.iter().all(|a| a.format == ArtifactFormat::TerraformHcl));
}

#[tokio::test]
async fn persistent_failure_exhausts_at_the_ceiling() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_text("cluster details");
    gateway.push_text(TASK_DEF_JSON);
    for i in 0..11 {
        gateway.push_text(format!("```hcl\ndraft {i}\n```"));
    }
    let validator = Arc::new(ScriptedValidator::failing_first(
        100,
        "terraform_plan",
        "Error: Invalid block definition",
    ));

    let report = RepairLoop::new(validator.clone())
        .run(&terraform_generator(gateway.clone()))
        .await
        .unwrap();

    assert_eq!(report.outcome, LoopOutcome::Exhausted);
    assert!(!report.succeeded());
    // Ten repairs plus the initial draft: eleven validations, then give up.
    assert_eq!(report.validations, 11);
    assert_eq!(validator.call_count(), 11);
    // 2 intermediate stages + 1 draft extraction + 10 repairs.
    assert_eq!(gateway.call_count(), 13);
    // The last artifact and diagnostic survive for inspection, and every
    // rejected draft is retained in rejection order.
    assert_eq!(report.artifact.unwrap().body, "draft 10");
    assert_eq!(report.history.len(), 11);
    assert_eq!(report.history[0].body, "draft 0");
    assert_eq!(report.history[10].body, "draft 10");
    assert!(report
        .last_diagnostic
        .unwrap()
        .message
        .contains("Invalid block"));
}

#[tokio::test]
async fn failed_regeneration_consumes_attempts_too() {
    let gateway = Arc::new(ScriptedGateway::with_responses([
        "cluster details",
        TASK_DEF_JSON,
        "```hcl\nfirst draft\n```",
        "no fence in this repair",
        "```hcl\nfixed draft\n```",
    ]));
    let validator = Arc::new(ScriptedValidator::failing_first(
        1,
        "terraform_plan",
        "Error: something",
    ));

    let report = RepairLoop::new(validator)
        .run(&terraform_generator(gateway))
        .await
        .unwrap();

    assert_eq!(report.outcome, LoopOutcome::Validated);
    // Attempt 1: validation failed. Attempt 2: repair lost the fence.
    assert_eq!(report.attempts_used, 2);
    assert_eq!(report.validations, 2);
    assert_eq!(report.artifact.unwrap().body, "fixed draft");
}

#[tokio::test]
async fn raised_cancel_token_stops_before_any_work() {
    let gateway = Arc::new(ScriptedGateway::with_responses(["unused"]));
    let validator = Arc::new(ScriptedValidator::new());
    let token: CancelToken = Arc::new(AtomicBool::new(false));
    token.store(true, Ordering::SeqCst);

    let report = RepairLoop::new(validator)
        .with_cancel_token(token)
        .run(&terraform_generator(gateway.clone()))
        .await
        .unwrap();

    assert_eq!(report.outcome, LoopOutcome::Cancelled);
    assert_eq!(report.validations, 0);
    assert_eq!(gateway.call_count(), 0);
}
