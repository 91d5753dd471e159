// Workflow definitions - the status/transition/gateway graph

//! # Workflow Model
//!
//! A [`Workflow`] is the complete definition of a business process: an
//! ordered collection of statuses, a set of directed transitions between
//! them, and optional gateways placed on the same display axis. The
//! definition is authored once and then executed many times over as
//! independent instances; instance execution never mutates it.
//!
//! Validation is two-tiered. [`Workflow::validate`] reports structural
//! errors (dangling endpoints, duplicate ids, orphan condition attachments)
//! and completeness warnings (missing or ambiguous INITIAL, missing FINAL),
//! so partially-authored graphs can still be persisted. Execution is
//! stricter: [`Workflow::validate_for_execution`] additionally demands a
//! clean report, exactly one INITIAL status, and at least one FINAL status,
//! rejecting ambiguous graphs instead of silently picking an entry point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::condition::ConditionTarget;
use super::gateway::Gateway;
use super::ids::{GatewayId, StatusId, TransitionId, WorkflowId};
use super::status::{Status, StatusKind};
use super::transition::Transition;
use crate::{Result, TrellisError};

/// Outcome of structural graph validation.
///
/// Errors make the graph unusable; warnings flag incompleteness that is
/// acceptable for a work-in-progress definition but blocks execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// No errors (warnings allowed).
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// No errors and no warnings: the graph is ready to execute,
    /// modulo the exactly-one-INITIAL rule checked at start time.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// A named, versioned definition of a business process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub description: Option<String>,
    pub version: String,

    /// Inactive workflows are kept for history but hidden from listings
    pub active: bool,

    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Statuses in insertion order; display order comes from
    /// [`Workflow::statuses_by_position`]
    pub statuses: Vec<Status>,

    /// Transitions in declared order; this order is what
    /// available-transition queries and auto-advance observe
    pub transitions: Vec<Transition>,

    /// Display-only branch points sharing the status position axis
    pub gateways: Vec<Gateway>,
}

impl Workflow {
    /// Create an empty, active workflow definition at version `1.0`.
    pub fn new<I, N, C>(id: I, name: N, created_by: C) -> Self
    where
        I: Into<WorkflowId>,
        N: Into<String>,
        C: Into<String>,
    {
        let now = Utc::now();
        Workflow {
            id: id.into(),
            name: name.into(),
            description: None,
            version: "1.0".to_string(),
            active: true,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            statuses: Vec::new(),
            transitions: Vec::new(),
            gateways: Vec::new(),
        }
    }

    /// Set the description, builder-style.
    pub fn with_description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the version label, builder-style.
    pub fn with_version<V: Into<String>>(mut self, version: V) -> Self {
        self.version = version.into();
        self
    }

    pub fn add_status(&mut self, status: Status) {
        self.statuses.push(status);
        self.touch();
    }

    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
        self.touch();
    }

    pub fn add_gateway(&mut self, gateway: Gateway) {
        self.gateways.push(gateway);
        self.touch();
    }

    pub fn remove_status(&mut self, id: &StatusId) -> Option<Status> {
        let index = self.statuses.iter().position(|s| &s.id == id)?;
        self.touch();
        Some(self.statuses.remove(index))
    }

    pub fn remove_transition(&mut self, id: &TransitionId) -> Option<Transition> {
        let index = self.transitions.iter().position(|t| &t.id == id)?;
        self.touch();
        Some(self.transitions.remove(index))
    }

    pub fn remove_gateway(&mut self, id: &GatewayId) -> Option<Gateway> {
        let index = self.gateways.iter().position(|g| &g.id == id)?;
        self.touch();
        Some(self.gateways.remove(index))
    }

    /// Toggle the active flag.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn find_status(&self, id: &StatusId) -> Option<&Status> {
        self.statuses.iter().find(|s| &s.id == id)
    }

    pub fn find_transition(&self, id: &TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| &t.id == id)
    }

    pub fn find_gateway(&self, id: &GatewayId) -> Option<&Gateway> {
        self.gateways.iter().find(|g| &g.id == id)
    }

    /// Transitions leaving the given status, in declared order.
    pub fn outgoing(&self, status: &StatusId) -> Vec<&Transition> {
        self.transitions.iter().filter(|t| &t.source == status).collect()
    }

    /// Transitions arriving at the given status, in declared order.
    pub fn incoming(&self, status: &StatusId) -> Vec<&Transition> {
        self.transitions.iter().filter(|t| &t.target == status).collect()
    }

    /// Statuses sorted by `position`, ties broken by insertion order.
    /// This ordering governs default-flow generation in the exporter.
    pub fn statuses_by_position(&self) -> Vec<&Status> {
        let mut sorted: Vec<&Status> = self.statuses.iter().collect();
        sorted.sort_by_key(|s| s.position);
        sorted
    }

    /// The unique INITIAL status.
    ///
    /// Fails with [`TrellisError::GraphInvalid`] when the graph has zero or
    /// more than one INITIAL status - ambiguous graphs are rejected rather
    /// than silently picking the first match.
    pub fn initial_status(&self) -> Result<&Status> {
        let mut initials = self.statuses.iter().filter(|s| s.kind == StatusKind::Initial);
        let first = initials.next().ok_or_else(|| TrellisError::GraphInvalid {
            workflow: self.id.to_string(),
            reason: "no INITIAL status defined".to_string(),
        })?;
        if initials.next().is_some() {
            return Err(TrellisError::GraphInvalid {
                workflow: self.id.to_string(),
                reason: "more than one INITIAL status defined".to_string(),
            });
        }
        Ok(first)
    }

    /// All FINAL statuses, in insertion order.
    pub fn final_statuses(&self) -> Vec<&Status> {
        self.statuses.iter().filter(|s| s.kind == StatusKind::Final).collect()
    }

    /// Structural validation: errors for broken references, warnings for
    /// incompleteness. Partial graphs may be persisted with warnings.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut seen_status_ids = HashSet::new();
        for status in &self.statuses {
            if !seen_status_ids.insert(&status.id) {
                report.errors.push(format!("duplicate status id '{}'", status.id));
            }
        }

        let mut seen_transition_ids = HashSet::new();
        for transition in &self.transitions {
            if !seen_transition_ids.insert(&transition.id) {
                report
                    .errors
                    .push(format!("duplicate transition id '{}'", transition.id));
            }
            if !seen_status_ids.contains(&transition.source) {
                report.errors.push(format!(
                    "transition '{}' references unknown source status '{}'",
                    transition.id, transition.source
                ));
            }
            if !seen_status_ids.contains(&transition.target) {
                report.errors.push(format!(
                    "transition '{}' references unknown target status '{}'",
                    transition.id, transition.target
                ));
            }
            for condition in &transition.conditions {
                if condition.attached_to != ConditionTarget::Transition(transition.id.clone()) {
                    report.errors.push(format!(
                        "condition '{}' on transition '{}' is attached to a different element",
                        condition.name, transition.id
                    ));
                }
            }
        }

        for status in &self.statuses {
            for condition in &status.conditions {
                if condition.attached_to != ConditionTarget::Status(status.id.clone()) {
                    report.errors.push(format!(
                        "condition '{}' on status '{}' is attached to a different element",
                        condition.name, status.id
                    ));
                }
            }
        }

        let initial_count = self
            .statuses
            .iter()
            .filter(|s| s.kind == StatusKind::Initial)
            .count();
        match initial_count {
            0 => report.warnings.push("no INITIAL status defined".to_string()),
            1 => {}
            n => report
                .warnings
                .push(format!("{n} INITIAL statuses defined, execution requires exactly one")),
        }
        if self.final_statuses().is_empty() {
            report.warnings.push("no FINAL status defined".to_string());
        }

        report
    }

    /// Strict validation gating instance execution: a clean report,
    /// exactly one INITIAL status, and at least one FINAL status.
    pub fn validate_for_execution(&self) -> Result<()> {
        let report = self.validate();
        if let Some(error) = report.errors.first() {
            return Err(TrellisError::GraphInvalid {
                workflow: self.id.to_string(),
                reason: error.clone(),
            });
        }
        self.initial_status()?;
        if self.final_statuses().is_empty() {
            return Err(TrellisError::GraphInvalid {
                workflow: self.id.to_string(),
                reason: "no FINAL status defined".to_string(),
            });
        }
        Ok(())
    }

    /// Statuses that can never be reached from the INITIAL statuses by
    /// following transitions. Depth-first walk over `outgoing` edges;
    /// useful for spotting authoring mistakes before activation.
    pub fn find_unreachable_statuses(&self) -> Vec<&Status> {
        let mut reachable: HashSet<&StatusId> = HashSet::new();
        let mut to_visit: Vec<&StatusId> = self
            .statuses
            .iter()
            .filter(|s| s.kind == StatusKind::Initial)
            .map(|s| &s.id)
            .collect();

        while let Some(status) = to_visit.pop() {
            if reachable.insert(status) {
                for transition in self.outgoing(status) {
                    if !reachable.contains(&transition.target) {
                        to_visit.push(&transition.target);
                    }
                }
            }
        }

        self.statuses
            .iter()
            .filter(|s| !reachable.contains(&s.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;

    fn linear_workflow() -> Workflow {
        let mut workflow = Workflow::new("review", "Document Review", "tests");
        workflow.add_status(Status::new("draft", "Draft", StatusKind::Initial, 1));
        workflow.add_status(Status::new("review", "Review", StatusKind::Normal, 2));
        workflow.add_status(Status::new("approved", "Approved", StatusKind::Final, 3));
        workflow.add_transition(Transition::new("submit", "draft", "review"));
        workflow.add_transition(Transition::new("approve", "review", "approved"));
        workflow
    }

    #[test]
    fn valid_linear_graph_is_clean_and_executable() {
        let workflow = linear_workflow();
        let report = workflow.validate();
        assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
        assert!(report.is_complete());
        assert!(workflow.validate_for_execution().is_ok());
    }

    #[test]
    fn dangling_endpoint_is_an_error() {
        let mut workflow = linear_workflow();
        workflow.add_transition(Transition::new("escape", "review", "nowhere"));

        let report = workflow.validate();
        assert!(!report.is_clean());
        assert!(report.errors[0].contains("unknown target status 'nowhere'"));
        assert!(matches!(
            workflow.validate_for_execution(),
            Err(TrellisError::GraphInvalid { .. })
        ));
    }

    #[test]
    fn missing_initial_and_final_are_warnings_not_errors() {
        let mut workflow = Workflow::new("partial", "Partial", "tests");
        workflow.add_status(Status::new("only", "Only", StatusKind::Normal, 1));

        let report = workflow.validate();
        assert!(report.is_clean());
        assert_eq!(report.warnings.len(), 2);
        // ...but execution refuses the same graph
        assert!(workflow.validate_for_execution().is_err());
    }

    #[test]
    fn multiple_initials_are_rejected_at_execution_time() {
        let mut workflow = linear_workflow();
        workflow.add_status(Status::new("draft2", "Second Draft", StatusKind::Initial, 0));

        assert!(workflow.validate().is_clean());
        let err = workflow.initial_status().unwrap_err();
        assert!(matches!(err, TrellisError::GraphInvalid { .. }));
        assert!(workflow.validate_for_execution().is_err());
    }

    #[test]
    fn mismatched_condition_attachment_is_an_orphan() {
        let mut workflow = linear_workflow();
        // Bypass Transition::add_condition, which would re-tag the record
        workflow.transitions[0]
            .conditions
            .push(Condition::for_transition("stray", "true", "approve"));

        let report = workflow.validate();
        assert!(!report.is_clean());
        assert!(report.errors[0].contains("attached to a different element"));
    }

    #[test]
    fn status_attached_conditions_validate_like_transition_ones() {
        let mut workflow = linear_workflow();
        workflow.statuses[1].add_condition(Condition::for_status(
            "on_review",
            "notify_reviewers",
            "anywhere", // re-tagged by add_condition
        ));
        assert!(workflow.validate().is_clean());

        // A record smuggled past add_condition keeps its foreign tag
        workflow.statuses[1]
            .conditions
            .push(Condition::for_status("stray", "true", "draft"));
        let report = workflow.validate();
        assert!(!report.is_clean());
        assert!(report.errors[0].contains("status 'review'"));
    }

    #[test]
    fn outgoing_and_incoming_follow_declared_order() {
        let mut workflow = linear_workflow();
        workflow.add_transition(Transition::new("reject", "review", "draft"));

        let from_review: Vec<&str> = workflow
            .outgoing(&StatusId::from("review"))
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(from_review, vec!["approve", "reject"]);

        let into_draft: Vec<&str> = workflow
            .incoming(&StatusId::from("draft"))
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(into_draft, vec!["reject"]);
    }

    #[test]
    fn position_sort_is_stable_on_ties() {
        let mut workflow = Workflow::new("ties", "Ties", "tests");
        workflow.add_status(Status::new("b", "B", StatusKind::Normal, 2));
        workflow.add_status(Status::new("a", "A", StatusKind::Initial, 1));
        workflow.add_status(Status::new("b2", "B2", StatusKind::Normal, 2));

        let order: Vec<&str> = workflow
            .statuses_by_position()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "b2"]);
    }

    #[test]
    fn unreachable_statuses_are_reported() {
        let mut workflow = linear_workflow();
        workflow.add_status(Status::new("orphan", "Orphan", StatusKind::Normal, 9));

        let unreachable: Vec<&str> = workflow
            .find_unreachable_statuses()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(unreachable, vec!["orphan"]);
    }
}
