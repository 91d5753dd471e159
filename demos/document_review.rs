// Document review demo - author a workflow, run instances through it
// Run with: cargo run --example document_review

use std::sync::Arc;

use trellis::{
    Condition, InMemoryStore, Monitor, Status, StatusKind, TaskService, Transition,
    TransitionEngine, Workflow, WorkflowStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("Trellis - Document Review Demo");
    println!("==============================");
    println!();

    // 1. Author the workflow graph
    println!("1. Authoring the document review workflow...");
    let mut workflow = Workflow::new("document_review", "Document Review", "demo")
        .with_description("Draft -> Review -> Approved/Rejected");
    workflow.add_status(Status::new("draft", "Draft", StatusKind::Initial, 1));
    workflow.add_status(Status::new("review", "Review", StatusKind::Normal, 2));
    workflow.add_status(Status::new("approved", "Approved", StatusKind::Final, 3));
    workflow.add_status(Status::new("rejected", "Rejected", StatusKind::Final, 4));
    workflow.add_transition(Transition::new("submit", "draft", "review").with_name("Submit"));
    workflow.add_transition(
        Transition::new("approve", "review", "approved")
            .with_name("Approve")
            .with_condition(Condition::for_transition(
                "reviewed",
                "review_complete",
                "approve",
            )),
    );
    workflow.add_transition(Transition::new("reject", "review", "rejected").with_name("Reject"));

    let report = workflow.validate();
    println!(
        "   validation: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    let store = Arc::new(InMemoryStore::new());
    store.create_workflow(workflow).await?;

    // 2. Wire the engine with the work-item hook
    let engine = TransitionEngine::new(store.clone())
        .with_hook(Arc::new(TaskService::new(store.clone())));
    let tasks = TaskService::new(store.clone());

    // 3. Walk one instance through explicit commands
    println!();
    println!("2. Driving an instance step by step...");
    let instance = engine
        .start_workflow(&"document_review".into(), Some("DOC-2024-001".into()), "alice")
        .await?;
    println!(
        "   started {} at '{}' ({})",
        instance.business_key, instance.current_status, instance.state
    );

    let available = engine.available_transitions(&instance.id).await?;
    println!(
        "   available from '{}': {:?}",
        instance.current_status,
        available.iter().map(|t| t.id.as_str()).collect::<Vec<_>>()
    );

    let instance = engine
        .execute_transition(&instance.id, &"submit".into(), "alice")
        .await?;
    println!(
        "   submitted -> '{}' ({}), history length {}",
        instance.current_status,
        instance.state,
        instance.history.len()
    );

    for task in tasks.tasks_for_instance(&instance.id).await? {
        println!("   work item created: '{}' for {:?}", task.name, task.assignee);
    }

    // Guard enforcement: the reviewer records completion as a variable,
    // then the guarded path allows the approval
    let mut reviewed = engine.get_instance(&instance.id).await?;
    reviewed.set_variable("review_complete", true);
    store.update_instance(reviewed).await?;

    let instance = engine
        .execute_transition_guarded(&instance.id, &"approve".into(), "bob")
        .await?;
    println!(
        "   approved -> '{}' ({}), ended at {:?}",
        instance.current_status, instance.state, instance.end_date
    );

    // 4. Unattended execution of a second instance
    println!();
    println!("3. Auto-advancing a second instance...");
    let auto = engine
        .run_workflow(&"document_review".into(), None, "batch")
        .await?;
    println!(
        "   {} finished at '{}' in {} steps",
        auto.business_key,
        auto.current_status,
        auto.history.len()
    );

    // 5. Monitoring summary
    println!();
    println!("4. Dashboard");
    let monitor = Monitor::new(store);
    println!("{}", monitor.dashboard().await?.to_json()?);

    Ok(())
}
