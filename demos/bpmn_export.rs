// BPMN export demo - serialize a workflow graph to BPMN 2.0 XML
// Run with: cargo run --example bpmn_export

use trellis::{
    BpmnExporter, Condition, Gateway, GatewayKind, Status, StatusKind, Transition, Workflow,
};

fn main() {
    tracing_subscriber::fmt().init();

    println!("Trellis - BPMN Export Demo");
    println!("==========================");
    println!();

    // A workflow with explicit transitions: flows follow the graph,
    // INITIAL/FINAL statuses re-root onto the start/end events
    let mut expense = Workflow::new("expense", "Expense Approval", "demo");
    expense.add_status(Status::new("submitted", "Submitted", StatusKind::Initial, 1));
    expense.add_status(Status::new("checked", "Checked", StatusKind::Normal, 2));
    expense.add_status(Status::new("paid", "Paid", StatusKind::Final, 3));
    expense.add_status(Status::new("declined", "Declined", StatusKind::Final, 4));
    expense.add_transition(Transition::new("check", "submitted", "checked").with_name("Check"));
    expense.add_transition(
        Transition::new("pay", "checked", "paid")
            .with_name("Pay out")
            .with_condition(Condition::for_transition("limit", "amount_within_limit", "pay")),
    );
    expense.add_transition(Transition::new("decline", "checked", "declined"));

    let exporter = BpmnExporter::new();
    println!("--- {} ---", expense.name);
    println!("{}", exporter.export(&expense));
    println!();

    // A partially authored workflow: no transitions yet, so the exporter
    // synthesizes the default sequential path over the position axis,
    // gateway included
    let mut draft = Workflow::new("draft", "Half Finished", "demo");
    draft.add_status(Status::new("intake", "Intake", StatusKind::Initial, 1));
    draft.add_status(Status::new("triage", "Triage", StatusKind::Normal, 2));
    draft.add_gateway(Gateway::new("route", "Route", GatewayKind::Exclusive, 3));
    draft.add_status(Status::new("handle", "Handle", StatusKind::Normal, 4));
    draft.add_status(Status::new("done", "Done", StatusKind::Final, 5));

    println!("--- {} ---", draft.name);
    println!("{}", exporter.export(&draft));
}
