// BPMN 2.0 export - deterministic serialization of the workflow graph

//! # Graph Exporter
//!
//! Serializes a workflow definition into BPMN 2.0 XML: the logical flow
//! graph (`process` section) plus its visual form (`BPMNDiagram` section
//! with pixel bounds and edge waypoints). Two deterministic passes:
//!
//! 1. **Layout**: the synthetic `start` node, then NORMAL statuses and
//!    gateways merged onto one position axis (stable sort by `position`,
//!    statuses before gateways on ties), then the synthetic `end` node,
//!    left to right at a fixed spacing. INITIAL and FINAL statuses are
//!    represented by `start`/`end` rather than task shapes.
//! 2. **Flows**: with explicit transitions, one `sequenceFlow` per distinct
//!    `(sourceRef, targetRef)` pair - first occurrence wins - with
//!    INITIAL-sourced edges re-rooted to `start` and FINAL-targeted edges
//!    re-rooted to `end`. Without transitions, a default sequential path is
//!    synthesized along the merged position order; an empty axis
//!    degenerates to the single `start -> end` edge.
//!
//! All bookkeeping lives in a [`LayoutContext`] created fresh per call, so
//! the exporter itself is stateless and exporting the same unmodified graph
//! twice yields byte-identical output.

use std::collections::{HashMap, HashSet};

use crate::models::{Gateway, Status, StatusKind, Transition, Workflow};

const X_ORIGIN: i32 = 150;
const X_SPACING: i32 = 150;

const EVENT_Y: i32 = 100;
const TASK_Y: i32 = 80;
const GATEWAY_Y: i32 = 90;

const EVENT_SIZE: i32 = 36;
const TASK_WIDTH: i32 = 100;
const TASK_HEIGHT: i32 = 80;
const GATEWAY_SIZE: i32 = 50;

/// Pixel bounds of one laid-out node.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

/// One emitted sequence flow, remembered for the diagram pass.
#[derive(Debug, Clone)]
struct Flow {
    id: String,
    source_ref: String,
    target_ref: String,
}

/// Per-export bookkeeping: node placement and recorded flows.
/// Created fresh for every `export` call - no state survives between calls.
#[derive(Default)]
struct LayoutContext {
    order: Vec<String>,
    bounds: HashMap<String, Bounds>,
    flows: Vec<Flow>,
}

impl LayoutContext {
    fn place(&mut self, node_ref: String, bounds: Bounds) {
        self.order.push(node_ref.clone());
        self.bounds.insert(node_ref, bounds);
    }

    fn record_flow(&mut self, id: String, source_ref: String, target_ref: String) {
        self.flows.push(Flow {
            id,
            source_ref,
            target_ref,
        });
    }
}

/// A node on the shared status/gateway position axis.
enum LayoutElement<'a> {
    Task(&'a Status),
    Gateway(&'a Gateway),
}

impl LayoutElement<'_> {
    fn node_ref(&self) -> String {
        match self {
            LayoutElement::Task(status) => format!("task_{}", status.id),
            LayoutElement::Gateway(gateway) => format!("gateway_{}", gateway.id),
        }
    }
}

/// Deterministic BPMN 2.0 exporter.
///
/// ```rust
/// # use trellis::{BpmnExporter, Status, StatusKind, Workflow};
/// let mut workflow = Workflow::new("wf", "Review", "demo");
/// workflow.add_status(Status::new("done", "Done", StatusKind::Final, 1));
///
/// let xml = BpmnExporter::new().export(&workflow);
/// assert!(xml.contains("sourceRef=\"start\" targetRef=\"end\""));
/// // Idempotent: the same graph always serializes identically
/// assert_eq!(xml, BpmnExporter::new().export(&workflow));
/// ```
#[derive(Default)]
pub struct BpmnExporter;

impl BpmnExporter {
    pub fn new() -> Self {
        BpmnExporter
    }

    /// Serialize the workflow graph and its layout. Pure: the workflow is
    /// not modified, and repeated calls return byte-identical output.
    pub fn export(&self, workflow: &Workflow) -> String {
        let mut ctx = LayoutContext::default();
        self.layout(workflow, &mut ctx);

        let process_id = escape_xml(&format!("Process_{}", workflow.name.replace(' ', "_")));

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(
            "<bpmn:definitions xmlns:bpmn=\"http://www.omg.org/spec/BPMN/20100524/MODEL\" \
             xmlns:bpmndi=\"http://www.omg.org/spec/BPMN/20100524/DI\" \
             xmlns:dc=\"http://www.omg.org/spec/DD/20100524/DC\" \
             xmlns:di=\"http://www.omg.org/spec/DD/20100524/DI\" \
             xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
             id=\"Definitions_1\" \
             targetNamespace=\"http://bpmn.io/schema/bpmn\">\n",
        );

        xml.push_str(&format!(
            "  <bpmn:process id=\"{}\" name=\"{}\" isExecutable=\"true\">\n",
            process_id,
            escape_xml(&workflow.name)
        ));
        xml.push_str("    <bpmn:startEvent id=\"start\" name=\"Start\" />\n");
        for element in merged_elements(workflow) {
            match element {
                LayoutElement::Task(status) => xml.push_str(&format!(
                    "    <bpmn:task id=\"task_{}\" name=\"{}\" />\n",
                    status.id,
                    escape_xml(&status.name)
                )),
                LayoutElement::Gateway(gateway) => xml.push_str(&format!(
                    "    <bpmn:exclusiveGateway id=\"gateway_{}\" name=\"{}\" />\n",
                    gateway.id,
                    escape_xml(&gateway.name)
                )),
            }
        }
        xml.push_str("    <bpmn:endEvent id=\"end\" name=\"End\" />\n");
        xml.push_str(&self.generate_flows(workflow, &mut ctx));
        xml.push_str("  </bpmn:process>\n");

        xml.push_str(&self.generate_diagram(&process_id, &ctx));
        xml.push_str("</bpmn:definitions>");
        xml
    }

    /// Pass 1: assign every node a slot on the x axis. Produces a stable
    /// left-to-right layout independent of graph topology.
    fn layout(&self, workflow: &Workflow, ctx: &mut LayoutContext) {
        let mut x = X_ORIGIN;
        ctx.place(
            "start".to_string(),
            Bounds {
                x,
                y: EVENT_Y,
                width: EVENT_SIZE,
                height: EVENT_SIZE,
            },
        );
        x += X_SPACING;

        for element in merged_elements(workflow) {
            let bounds = match element {
                LayoutElement::Task(_) => Bounds {
                    x,
                    y: TASK_Y,
                    width: TASK_WIDTH,
                    height: TASK_HEIGHT,
                },
                LayoutElement::Gateway(_) => Bounds {
                    x,
                    y: GATEWAY_Y,
                    width: GATEWAY_SIZE,
                    height: GATEWAY_SIZE,
                },
            };
            ctx.place(element.node_ref(), bounds);
            x += X_SPACING;
        }

        ctx.place(
            "end".to_string(),
            Bounds {
                x,
                y: EVENT_Y,
                width: EVENT_SIZE,
                height: EVENT_SIZE,
            },
        );
    }

    /// Pass 2: emit sequence flows and record them for the diagram.
    fn generate_flows(&self, workflow: &Workflow, ctx: &mut LayoutContext) -> String {
        let mut xml = String::new();

        if !workflow.transitions.is_empty() {
            let mut seen: HashSet<(String, String)> = HashSet::new();
            let mut index = 0;
            for transition in &workflow.transitions {
                let source_ref = source_ref(workflow, transition);
                let target_ref = target_ref(workflow, transition);
                // Duplicate logical pairs collapse onto the first occurrence
                if !seen.insert((source_ref.clone(), target_ref.clone())) {
                    continue;
                }

                let flow_id = format!("flow_{index}");
                index += 1;

                xml.push_str(&format!(
                    "    <bpmn:sequenceFlow id=\"{flow_id}\" sourceRef=\"{source_ref}\" targetRef=\"{target_ref}\""
                ));
                if let Some(name) = transition.name.as_deref() {
                    if !name.is_empty() {
                        xml.push_str(&format!(" name=\"{}\"", escape_xml(name)));
                    }
                }
                match guard_text(transition) {
                    Some(guard) => {
                        xml.push_str(">\n");
                        xml.push_str(&format!(
                            "      <bpmn:conditionExpression xsi:type=\"bpmn:tFormalExpression\">{}</bpmn:conditionExpression>\n",
                            escape_xml(&guard)
                        ));
                        xml.push_str("    </bpmn:sequenceFlow>\n");
                    }
                    None => xml.push_str(" />\n"),
                }

                ctx.record_flow(flow_id, source_ref, target_ref);
            }
        } else {
            // No explicit transitions: synthesize the default sequential
            // path along the merged position axis. With an empty axis this
            // is just start -> end.
            let mut index = 0;
            let mut current = "start".to_string();
            for element in merged_elements(workflow) {
                let target = element.node_ref();
                let flow_id = format!("flow_{index}");
                index += 1;
                xml.push_str(&format!(
                    "    <bpmn:sequenceFlow id=\"{flow_id}\" sourceRef=\"{current}\" targetRef=\"{target}\" />\n"
                ));
                ctx.record_flow(flow_id, current, target.clone());
                current = target;
            }
            let flow_id = format!("flow_{index}");
            xml.push_str(&format!(
                "    <bpmn:sequenceFlow id=\"{flow_id}\" sourceRef=\"{current}\" targetRef=\"end\" />\n"
            ));
            ctx.record_flow(flow_id, current, "end".to_string());
        }

        xml
    }

    /// Serialize the diagram section: bounds for every laid-out node and
    /// two-point waypoints for every recorded flow.
    fn generate_diagram(&self, process_id: &str, ctx: &LayoutContext) -> String {
        let mut xml = String::new();
        xml.push_str("  <bpmndi:BPMNDiagram id=\"BPMNDiagram_1\">\n");
        xml.push_str(&format!(
            "    <bpmndi:BPMNPlane id=\"BPMNPlane_1\" bpmnElement=\"{process_id}\">\n"
        ));

        for node_ref in &ctx.order {
            let bounds = &ctx.bounds[node_ref];
            xml.push_str(&format!(
                "      <bpmndi:BPMNShape id=\"{node_ref}_di\" bpmnElement=\"{node_ref}\">\n"
            ));
            xml.push_str(&format!(
                "        <dc:Bounds x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" />\n",
                bounds.x, bounds.y, bounds.width, bounds.height
            ));
            xml.push_str("      </bpmndi:BPMNShape>\n");
        }

        for flow in &ctx.flows {
            let (Some(source), Some(target)) = (
                ctx.bounds.get(&flow.source_ref),
                ctx.bounds.get(&flow.target_ref),
            ) else {
                // A flow can reference a node outside the layout (e.g. a
                // transition onto an undeclared status); skip its edge.
                continue;
            };

            xml.push_str(&format!(
                "      <bpmndi:BPMNEdge id=\"{}_di\" bpmnElement=\"{}\">\n",
                flow.id, flow.id
            ));
            xml.push_str(&format!(
                "        <di:waypoint x=\"{}\" y=\"{}\" />\n",
                source.x + source.width,
                source.y + source.height / 2
            ));
            xml.push_str(&format!(
                "        <di:waypoint x=\"{}\" y=\"{}\" />\n",
                target.x,
                target.y + target.height / 2
            ));
            xml.push_str("      </bpmndi:BPMNEdge>\n");
        }

        xml.push_str("    </bpmndi:BPMNPlane>\n");
        xml.push_str("  </bpmndi:BPMNDiagram>\n");
        xml
    }
}

/// NORMAL statuses and gateways merged onto one position axis. Stable sort:
/// equal positions keep statuses before gateways, each in insertion order.
fn merged_elements(workflow: &Workflow) -> Vec<LayoutElement<'_>> {
    let mut elements: Vec<(i32, LayoutElement<'_>)> = workflow
        .statuses
        .iter()
        .filter(|s| s.kind == StatusKind::Normal)
        .map(|s| (s.position, LayoutElement::Task(s)))
        .collect();
    elements.extend(
        workflow
            .gateways
            .iter()
            .map(|g| (g.position, LayoutElement::Gateway(g))),
    );
    elements.sort_by_key(|(position, _)| *position);
    elements.into_iter().map(|(_, element)| element).collect()
}

/// Visual source of a transition: INITIAL statuses re-root to `start`.
fn source_ref(workflow: &Workflow, transition: &Transition) -> String {
    match workflow.find_status(&transition.source) {
        Some(status) if status.kind == StatusKind::Initial => "start".to_string(),
        Some(status) => format!("task_{}", status.id),
        None => "start".to_string(),
    }
}

/// Visual target of a transition: FINAL statuses re-root to `end`.
fn target_ref(workflow: &Workflow, transition: &Transition) -> String {
    match workflow.find_status(&transition.target) {
        Some(status) if status.kind == StatusKind::Final => "end".to_string(),
        Some(status) => format!("task_{}", status.id),
        None => "end".to_string(),
    }
}

/// Combined guard text for a flow: the inline expression when present,
/// otherwise active attached conditions joined with `" AND "`.
fn guard_text(transition: &Transition) -> Option<String> {
    if let Some(expression) = transition.guard_expression.as_deref() {
        if !expression.is_empty() {
            return Some(expression.to_string());
        }
    }

    let expressions: Vec<&str> = transition
        .active_conditions()
        .map(|c| c.expression.as_str())
        .filter(|e| !e.is_empty())
        .collect();
    if expressions.is_empty() {
        None
    } else {
        Some(expressions.join(" AND "))
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
