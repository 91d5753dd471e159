// Transition engine - drives instances through the workflow graph

//! # Transition Engine
//!
//! The state machine driver. Per instance the coarse lifecycle is
//! `Created -> InProgress -> Completed`; `current_status` is the
//! fine-grained position inside the graph. An instance completes the first
//! time it enters a FINAL status, and once completed no further transition
//! request succeeds.
//!
//! ## Atomicity and side effects
//!
//! A successful transition commits the status change, the appended history
//! row, and the terminal-state flags as one store write
//! ([`WorkflowStore::update_instance`]). The status-entry hook and event
//! emission happen *after* that commit and are best-effort: a hook failure
//! is logged and swallowed, never rolled back into the transition.
//!
//! ## Concurrency
//!
//! Single writer per instance is assumed; racing callers must be serialized
//! by the surrounding persistence layer. Distinct instances share no
//! mutable state and advance independently.
//!
//! ## Guards
//!
//! [`available_transitions`](TransitionEngine::available_transitions) and
//! [`execute_transition`](TransitionEngine::execute_transition) ignore
//! guards entirely - graph shape only. The guard-aware twins
//! [`satisfiable_transitions`](TransitionEngine::satisfiable_transitions)
//! and
//! [`execute_transition_guarded`](TransitionEngine::execute_transition_guarded)
//! consult the [`GuardEvaluator`]. Every call site picks one explicitly.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::events::EventBus;
use super::guards::{GuardContext, GuardEvaluator};
use super::storage::WorkflowStore;
use super::tasks::StatusHook;
use crate::models::{Instance, Status, Transition, TransitionId, Workflow, WorkflowId};
use crate::{Result, TrellisError};

/// Tunables for unattended execution.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Step budget for [`TransitionEngine::auto_advance`]: a guard against
    /// cyclic graphs looping forever, not a correctness bound. Exhausting
    /// it logs a warning and returns the instance wherever it got to.
    pub max_auto_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { max_auto_steps: 100 }
    }
}

/// The state machine driver over a [`WorkflowStore`].
pub struct TransitionEngine {
    store: Arc<dyn WorkflowStore>,
    guards: GuardEvaluator,
    hook: Option<Arc<dyn StatusHook>>,
    events: EventBus,
    config: EngineConfig,
}

impl TransitionEngine {
    /// Engine with default guards, no status hook, and default config.
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        TransitionEngine {
            store,
            guards: GuardEvaluator::new(),
            hook: None,
            events: EventBus::new(),
            config: EngineConfig::default(),
        }
    }

    /// Install a status-entry hook, builder-style.
    pub fn with_hook(mut self, hook: Arc<dyn StatusHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Replace the guard evaluator, builder-style.
    pub fn with_guards(mut self, guards: GuardEvaluator) -> Self {
        self.guards = guards;
        self
    }

    /// Replace the config, builder-style.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The engine's event bus, for subscribing to lifecycle events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Start a new instance of a workflow.
    ///
    /// The graph must validate for execution (clean report, exactly one
    /// INITIAL, at least one FINAL). When no business key is supplied one
    /// is generated as `WF_{workflow_id}_{unix_millis}`. The instance is
    /// created at the INITIAL status in the `Created` state; no hook fires
    /// for the initial placement.
    pub async fn start_workflow(
        &self,
        workflow_id: &WorkflowId,
        business_key: Option<String>,
        created_by: &str,
    ) -> Result<Instance> {
        let workflow = self.load_workflow(workflow_id).await?;
        workflow.validate_for_execution()?;
        let initial = workflow.initial_status()?;

        let business_key = match business_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => key,
            None => format!("WF_{}_{}", workflow_id, Utc::now().timestamp_millis()),
        };

        let instance = Instance::new(
            workflow.id.clone(),
            business_key,
            initial.id.clone(),
            created_by,
        );
        let instance = self.store.create_instance(instance).await?;

        info!(
            workflow = %workflow_id,
            instance = %instance.id,
            business_key = %instance.business_key,
            "workflow instance started"
        );
        self.events.emit_instance_started(&instance);
        Ok(instance)
    }

    /// Execute a specific transition on an instance. Guards are not
    /// consulted; use [`execute_transition_guarded`] to enforce them.
    ///
    /// Fails with `InvalidTransition` when the instance has completed or
    /// the transition's source is not the instance's current status; the
    /// instance is left unmodified in every failure case.
    ///
    /// [`execute_transition_guarded`]: TransitionEngine::execute_transition_guarded
    pub async fn execute_transition(
        &self,
        instance_id: &Uuid,
        transition_id: &TransitionId,
        executed_by: &str,
    ) -> Result<Instance> {
        let instance = self.load_instance(instance_id).await?;
        let workflow = self.load_workflow(&instance.workflow_id).await?;
        let transition = Self::resolve_transition(&workflow, transition_id)?;
        self.apply(instance, &workflow, transition, executed_by).await
    }

    /// Execute a transition with guard enforcement: fails with
    /// `GuardFailed` when the combined guard evaluates false, before any
    /// state is touched.
    pub async fn execute_transition_guarded(
        &self,
        instance_id: &Uuid,
        transition_id: &TransitionId,
        executed_by: &str,
    ) -> Result<Instance> {
        let instance = self.load_instance(instance_id).await?;
        let workflow = self.load_workflow(&instance.workflow_id).await?;
        let transition = Self::resolve_transition(&workflow, transition_id)?;

        let ctx = GuardContext::from_instance(&instance);
        if !self.guards.is_satisfied(transition, &ctx) {
            return Err(TrellisError::GuardFailed {
                transition: transition_id.to_string(),
            });
        }
        self.apply(instance, &workflow, transition, executed_by).await
    }

    /// All transitions whose source is the instance's current status, in
    /// the workflow's declared order. Raw graph shape - guards are the
    /// caller's concern here.
    pub async fn available_transitions(&self, instance_id: &Uuid) -> Result<Vec<Transition>> {
        let instance = self.load_instance(instance_id).await?;
        let workflow = self.load_workflow(&instance.workflow_id).await?;
        Ok(workflow
            .outgoing(&instance.current_status)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Available transitions whose guards are currently satisfied against
    /// the instance's variables.
    pub async fn satisfiable_transitions(&self, instance_id: &Uuid) -> Result<Vec<Transition>> {
        let instance = self.load_instance(instance_id).await?;
        let workflow = self.load_workflow(&instance.workflow_id).await?;
        let ctx = GuardContext::from_instance(&instance);
        Ok(workflow
            .outgoing(&instance.current_status)
            .into_iter()
            .filter(|t| self.guards.is_satisfied(t, &ctx))
            .cloned()
            .collect())
    }

    /// Single-step advance: fire the first available transition (declared
    /// order, guard-free) once. Fails with `InvalidInput` when the current
    /// status has no outgoing transition.
    pub async fn advance(&self, instance_id: &Uuid, executed_by: &str) -> Result<Instance> {
        let instance = self.load_instance(instance_id).await?;
        let workflow = self.load_workflow(&instance.workflow_id).await?;
        let next = workflow
            .outgoing(&instance.current_status)
            .first()
            .map(|t| t.id.clone())
            .ok_or_else(|| {
                TrellisError::InvalidInput(format!(
                    "no transition available from status '{}'",
                    instance.current_status
                ))
            })?;
        self.execute_transition(instance_id, &next, executed_by).await
    }

    /// Unattended execution: repeatedly fire the first available transition
    /// (declared order, guard-free) until a FINAL status is reached, no
    /// transition is available, or the step budget runs out.
    pub async fn auto_advance(&self, instance_id: &Uuid, executed_by: &str) -> Result<Instance> {
        let mut instance = self.load_instance(instance_id).await?;
        let workflow = self.load_workflow(&instance.workflow_id).await?;

        let mut steps = 0;
        while !instance.is_completed() {
            if steps >= self.config.max_auto_steps {
                warn!(
                    instance = %instance.id,
                    steps,
                    "auto-advance stopped at step budget, possible cycle in graph"
                );
                break;
            }

            let next = match workflow.outgoing(&instance.current_status).first() {
                Some(transition) => (*transition).id.clone(),
                None => break,
            };
            instance = self
                .execute_transition(instance_id, &next, executed_by)
                .await?;
            steps += 1;
        }

        Ok(instance)
    }

    /// Start an instance and immediately auto-advance it.
    pub async fn run_workflow(
        &self,
        workflow_id: &WorkflowId,
        business_key: Option<String>,
        created_by: &str,
    ) -> Result<Instance> {
        let instance = self
            .start_workflow(workflow_id, business_key, created_by)
            .await?;
        self.auto_advance(&instance.id, created_by).await
    }

    /// Load an instance, mapping absence to `InstanceNotFound`.
    pub async fn get_instance(&self, instance_id: &Uuid) -> Result<Instance> {
        self.load_instance(instance_id).await
    }

    /// Export a workflow's BPMN diagram by id.
    pub async fn export_diagram(&self, workflow_id: &WorkflowId) -> Result<String> {
        let workflow = self.load_workflow(workflow_id).await?;
        Ok(super::bpmn::BpmnExporter::new().export(&workflow))
    }

    // Validate applicability, commit the state change, then run the
    // best-effort side effects.
    async fn apply(
        &self,
        mut instance: Instance,
        workflow: &Workflow,
        transition: &Transition,
        executed_by: &str,
    ) -> Result<Instance> {
        if instance.is_completed() {
            return Err(TrellisError::InvalidTransition {
                instance: instance.id,
                transition: transition.id.to_string(),
                reason: "instance is already completed".to_string(),
            });
        }
        if transition.source != instance.current_status {
            return Err(TrellisError::InvalidTransition {
                instance: instance.id,
                transition: transition.id.to_string(),
                reason: format!(
                    "source status '{}' does not match current status '{}'",
                    transition.source, instance.current_status
                ),
            });
        }

        let target = workflow
            .find_status(&transition.target)
            .ok_or_else(|| TrellisError::StatusNotFound {
                id: transition.target.to_string(),
            })?;

        let previous = instance.current_status.clone();
        instance.apply_transition(transition, target.kind.is_final(), executed_by);

        // Atomic unit of work: status change + history row + terminal flags
        let instance = self.store.update_instance(instance).await?;

        info!(
            instance = %instance.id,
            transition = %transition.id,
            from = %previous,
            to = %instance.current_status,
            "transition executed"
        );

        if !target.kind.is_final() {
            self.enter_status(&instance, target, executed_by).await;
        }

        self.events
            .emit_transition_executed(&instance, &transition.id, &previous, executed_by);
        if instance.is_completed() {
            self.events.emit_instance_completed(&instance);
        }

        Ok(instance)
    }

    // Fire the status-entry hook. Best-effort: failures are logged and
    // swallowed so they can never undo the committed transition.
    async fn enter_status(&self, instance: &Instance, status: &Status, actor: &str) {
        let Some(hook) = &self.hook else { return };
        if let Err(error) = hook.on_status_entered(instance, status, actor).await {
            let recovered = TrellisError::HookFailed(error.to_string());
            warn!(
                instance = %instance.id,
                status = %status.id,
                error = %recovered,
                "status hook failed, transition stands"
            );
        }
    }

    fn resolve_transition<'a>(
        workflow: &'a Workflow,
        transition_id: &TransitionId,
    ) -> Result<&'a Transition> {
        workflow
            .find_transition(transition_id)
            .ok_or_else(|| TrellisError::TransitionNotFound {
                id: transition_id.to_string(),
            })
    }

    async fn load_workflow(&self, workflow_id: &WorkflowId) -> Result<Workflow> {
        self.store
            .get_workflow(workflow_id)
            .await?
            .ok_or_else(|| TrellisError::WorkflowNotFound {
                id: workflow_id.to_string(),
            })
    }

    async fn load_instance(&self, instance_id: &Uuid) -> Result<Instance> {
        self.store
            .get_instance(instance_id)
            .await?
            .ok_or_else(|| TrellisError::InstanceNotFound { id: *instance_id })
    }
}
