//! The graph walk itself (§4.4).
//!
//! [`Executor::run`] drives one execution from its trigger node to a
//! terminal status: popping a FIFO ready queue, assembling each node's
//! input, resolving its config templates, invoking the registered
//! handler under a deadline, persisting the result, and pushing
//! whichever successors the node's output activates.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nebula_core::{
    Execution, ExecutionId, ExecutionStatus, NodeId, NodeResult, OnErrorPolicy, Workflow,
};
use nebula_expression::ExpressionEngine;
use nebula_node::{ExecutionContext, NodeRegistry};
use nebula_ports::{CredentialProvider, Event, EventPublisher, ExecutionService, WorkflowService};
use parking_lot::RwLock;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::assemble::assemble_input;
use crate::control::control_signal;
use crate::deadline;
use crate::error::EngineError;

/// One loop nesting level: the fanning-out loop node's id paired with
/// the iteration index that produced this branch. A node's full
/// [`Scope`] is the stack of levels it is nested under, innermost
/// last.
type Scope = Vec<(String, usize)>;

/// A node waiting to run.
#[derive(Debug, Clone)]
struct ReadyItem {
    node_id: String,
    scope: Scope,
}

fn result_key(item: &ReadyItem) -> String {
    match item.scope.last() {
        Some((_, iter)) => format!("{}#{}", item.node_id, iter),
        None => item.node_id.clone(),
    }
}

fn merge_wait_blocked(workflow: &Workflow, outputs: &Outputs, scope: &Scope, to: &str) -> bool {
    let Some(node) = workflow.node(to) else {
        return false;
    };
    if node.node_type != "merge" {
        return false;
    }
    let is_wait = node.config.get("mode").and_then(Value::as_str) == Some("wait");
    if !is_wait {
        return false;
    }
    workflow
        .incoming(to)
        .any(|edge| !outputs.contains_key(&(scope.clone(), edge.from.clone())))
}

type Outputs = HashMap<(Scope, String), Value>;
type PendingErrors = HashMap<(Scope, String), Value>;

/// Drives executions to completion against the node [`NodeRegistry`]
/// and the external ports every run needs (§4.4, §6).
pub struct Executor {
    registry: Arc<NodeRegistry>,
    workflows: Arc<dyn WorkflowService>,
    executions: Arc<dyn ExecutionService>,
    events: Arc<dyn EventPublisher>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    expression_engine: ExpressionEngine,
    default_timeout: Duration,
}

impl Executor {
    /// Build an executor over the given ports. `default_timeout` is
    /// used for any node without its own `timeout` option.
    #[must_use]
    pub fn new(
        registry: Arc<NodeRegistry>,
        workflows: Arc<dyn WorkflowService>,
        executions: Arc<dyn ExecutionService>,
        events: Arc<dyn EventPublisher>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            workflows,
            executions,
            events,
            credentials: None,
            expression_engine: ExpressionEngine::new(),
            default_timeout,
        }
    }

    /// Attach the credential provider forwarded to every node's
    /// [`ExecutionContext`].
    #[must_use]
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Drive `execution_id` to a terminal status, or until `cancellation`
    /// fires.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for failures around node invocation:
    /// missing execution/workflow, an invalid graph, a missing trigger
    /// node, or a port failure. A node handler's own error is never
    /// returned here -- it is routed through the node's `onError`
    /// policy and reflected in the final [`ExecutionStatus`].
    pub async fn run(
        &self,
        execution_id: ExecutionId,
        cancellation: CancellationToken,
    ) -> Result<ExecutionStatus, EngineError> {
        let mut execution = self
            .executions
            .get(&execution_id)
            .await?
            .ok_or(EngineError::ExecutionNotFound(execution_id))?;
        let workflow = self
            .workflows
            .get(&execution.workflow_id)
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound(execution.workflow_id.to_string()))?;
        workflow.validate_schema().map_err(EngineError::InvalidGraph)?;

        let trigger_id = workflow
            .nodes
            .iter()
            .find(|n| n.node_type == execution.trigger_type)
            .map(|n| n.id.clone())
            .ok_or_else(|| EngineError::TriggerNotFound(execution.trigger_type.clone()))?;

        execution.mark_running();
        self.executions
            .set_status(&execution_id, ExecutionStatus::Running)
            .await?;
        self.events
            .publish(Event::ExecutionStarted {
                execution_id,
                workflow_id: execution.workflow_id.clone(),
            })
            .await;

        let variables = Arc::new(RwLock::new(execution.variables.clone()));
        let mut outputs: Outputs = HashMap::new();
        let mut pending_errors: PendingErrors = PendingErrors::new();
        let mut ready: VecDeque<ReadyItem> = VecDeque::new();
        ready.push_back(ReadyItem {
            node_id: trigger_id,
            scope: Vec::new(),
        });

        let final_status = loop {
            if cancellation.is_cancelled() {
                break ExecutionStatus::Cancelled;
            }
            let Some(item) = ready.pop_front() else {
                break ExecutionStatus::Succeeded;
            };

            let node = workflow
                .node(&item.node_id)
                .ok_or_else(|| EngineError::InvalidGraph(format!("dangling node id {}", item.node_id)))?
                .clone();

            let Some(handler) = self.registry.get(&node.node_type) else {
                let err = nebula_error::Error::fatal(format!("unknown_node_type: {}", node.node_type))
                    .with_node(node.id.clone());
                self.record_failure(&execution_id, &mut execution, &item, err, 0)
                    .await?;
                break ExecutionStatus::Failed;
            };

            let pending_error = pending_errors.remove(&(item.scope.clone(), item.node_id.clone()));
            let scope = item.scope.clone();
            let raw_input = assemble_input(
                &workflow,
                &item.node_id,
                |pred| outputs.get(&(scope.clone(), pred.to_string())).cloned(),
                &execution.input_data,
                &variables.read(),
                pending_error,
            );
            let resolved_config = nebula_expression::resolve(
                &Value::Object(node.config.clone()),
                &raw_input,
                &self.expression_engine,
            );
            let config_map = resolved_config.as_object().cloned().unwrap_or_default();

            let node_timeout = node
                .timeout
                .map(Duration::from_millis)
                .unwrap_or(self.default_timeout);
            let on_error = node.on_error.clone().unwrap_or_default();
            let max_attempts = match (&on_error, node.retry_policy) {
                (OnErrorPolicy::Retry, Some(policy)) => policy.max_retries + 1,
                _ => 1,
            };

            let invocation_started = Instant::now();
            let mut attempt: u32 = 0;
            let outcome = loop {
                attempt += 1;
                let node_token = cancellation.child_token();
                let mut ctx = ExecutionContext::new(
                    execution_id,
                    execution.workflow_id.clone(),
                    execution.workspace_id.clone(),
                    NodeId::new(node.id.clone()),
                    raw_input.clone(),
                    config_map.clone(),
                    variables.clone(),
                )
                .with_cancellation(node_token);
                if let Some(provider) = &self.credentials {
                    ctx = ctx.with_credentials(provider.clone());
                }

                let step = deadline::race(node_timeout, &cancellation, handler.execute(&ctx)).await;
                let result = match step {
                    deadline::Outcome::Cancelled => break Err(nebula_error::Error::cancelled()),
                    deadline::Outcome::TimedOut => {
                        Err(nebula_error::Error::timeout(format!(
                            "node {} exceeded its {:?} deadline",
                            node.id, node_timeout
                        ))
                        .with_node(node.id.clone()))
                    }
                    deadline::Outcome::Completed(r) => r.map_err(|e| e.with_node(node.id.clone())),
                };

                match &result {
                    Ok(_) => break result,
                    Err(err) if on_error == OnErrorPolicy::Retry && !err.is_fatal() && attempt < max_attempts => {
                        let policy = node.retry_policy.expect("max_attempts > 1 implies a retry_policy");
                        let delay = policy
                            .backoff
                            .delay_ms(attempt, policy.initial_delay_ms, policy.max_delay_ms);
                        tokio::select! {
                            () = tokio::time::sleep(Duration::from_millis(delay)) => {}
                            () = cancellation.cancelled() => break Err(nebula_error::Error::cancelled()),
                        }
                    }
                    Err(_) => break result,
                }
            };

            let duration_ms = u64::try_from(invocation_started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match outcome {
                Ok(output) => {
                    let key = result_key(&item);
                    outputs.insert((item.scope.clone(), item.node_id.clone()), Value::Object(output.clone()));
                    execution.record_node_result(
                        key.clone(),
                        NodeResult {
                            status: ExecutionStatus::Succeeded,
                            output: Some(Value::Object(output.clone())),
                            error: None,
                            duration_ms,
                        },
                    );
                    self.executions
                        .append_node_result(&execution_id, key.clone(), execution.node_results[&key].clone())
                        .await?;
                    self.executions
                        .merge_variables(&execution_id, variables.read().clone())
                        .await?;
                    self.events
                        .publish(Event::NodeCompleted {
                            execution_id,
                            node_key: key,
                            succeeded: true,
                        })
                        .await;

                    let signal = control_signal(&node.node_type, &output);
                    for port in &signal.ports {
                        for edge in workflow.outgoing(&item.node_id).filter(|e| &e.from_port == port) {
                            if merge_wait_blocked(&workflow, &outputs, &item.scope, &edge.to) {
                                continue;
                            }
                            ready.push_back(ReadyItem {
                                node_id: edge.to.clone(),
                                scope: item.scope.clone(),
                            });
                        }
                    }
                    if let Some((port, iterations)) = signal.fan_out {
                        for iteration in iterations {
                            let mut child_scope = item.scope.clone();
                            child_scope.push((item.node_id.clone(), iteration.index));
                            let bound_item = iteration.record.get("item").cloned().unwrap_or(Value::Null);
                            outputs.insert((child_scope.clone(), item.node_id.clone()), bound_item);
                            for edge in workflow.outgoing(&item.node_id).filter(|e| e.from_port == port) {
                                ready.push_back(ReadyItem {
                                    node_id: edge.to.clone(),
                                    scope: child_scope.clone(),
                                });
                            }
                        }
                    }
                }
                Err(err) if err.is_fatal() => {
                    self.record_failure(&execution_id, &mut execution, &item, err, duration_ms)
                        .await?;
                    break ExecutionStatus::Failed;
                }
                Err(err) => match on_error {
                    OnErrorPolicy::Stop => {
                        self.record_failure(&execution_id, &mut execution, &item, err, duration_ms)
                            .await?;
                        break ExecutionStatus::Failed;
                    }
                    OnErrorPolicy::Retry => {
                        self.record_failure(&execution_id, &mut execution, &item, err, duration_ms)
                            .await?;
                        break ExecutionStatus::Failed;
                    }
                    OnErrorPolicy::Continue => {
                        let key = result_key(&item);
                        let error_value = serde_json::to_value(&err).unwrap_or(Value::Null);
                        outputs.insert((item.scope.clone(), item.node_id.clone()), Value::Object(Default::default()));
                        execution.record_node_result(
                            key.clone(),
                            NodeResult {
                                status: ExecutionStatus::Succeeded,
                                output: Some(Value::Object(Default::default())),
                                error: Some(err),
                                duration_ms,
                            },
                        );
                        self.executions
                            .append_node_result(&execution_id, key.clone(), execution.node_results[&key].clone())
                            .await?;
                        self.events
                            .publish(Event::NodeCompleted {
                                execution_id,
                                node_key: key,
                                succeeded: true,
                            })
                            .await;
                        for edge in workflow.outgoing(&item.node_id).filter(|e| e.from_port == nebula_core::MAIN_PORT) {
                            if merge_wait_blocked(&workflow, &outputs, &item.scope, &edge.to) {
                                continue;
                            }
                            pending_errors.insert((item.scope.clone(), edge.to.clone()), error_value.clone());
                            ready.push_back(ReadyItem {
                                node_id: edge.to.clone(),
                                scope: item.scope.clone(),
                            });
                        }
                    }
                    OnErrorPolicy::Branch { port } => {
                        let key = result_key(&item);
                        let error_value = serde_json::to_value(&err).unwrap_or(Value::Null);
                        outputs.insert((item.scope.clone(), item.node_id.clone()), Value::Null);
                        execution.record_node_result(
                            key.clone(),
                            NodeResult {
                                status: ExecutionStatus::Failed,
                                output: None,
                                error: Some(err),
                                duration_ms,
                            },
                        );
                        self.executions
                            .append_node_result(&execution_id, key.clone(), execution.node_results[&key].clone())
                            .await?;
                        self.events
                            .publish(Event::NodeCompleted {
                                execution_id,
                                node_key: key,
                                succeeded: false,
                            })
                            .await;
                        for edge in workflow.outgoing(&item.node_id).filter(|e| e.from_port == port) {
                            if merge_wait_blocked(&workflow, &outputs, &item.scope, &edge.to) {
                                continue;
                            }
                            pending_errors.insert((item.scope.clone(), edge.to.clone()), error_value.clone());
                            ready.push_back(ReadyItem {
                                node_id: edge.to.clone(),
                                scope: item.scope.clone(),
                            });
                        }
                    }
                },
            }
        };

        execution.mark_terminal(final_status);
        self.executions.set_status(&execution_id, final_status).await?;
        self.events
            .publish(Event::ExecutionFinished {
                execution_id,
                status: final_status,
            })
            .await;
        Ok(final_status)
    }

    async fn record_failure(
        &self,
        execution_id: &ExecutionId,
        execution: &mut Execution,
        item: &ReadyItem,
        err: nebula_error::Error,
        duration_ms: u64,
    ) -> Result<(), EngineError> {
        let key = result_key(item);
        execution.record_node_result(
            key.clone(),
            NodeResult {
                status: ExecutionStatus::Failed,
                output: None,
                error: Some(err),
                duration_ms,
            },
        );
        self.executions
            .append_node_result(execution_id, key.clone(), execution.node_results[&key].clone())
            .await?;
        self.events
            .publish(Event::NodeCompleted {
                execution_id: *execution_id,
                node_key: key,
                succeeded: false,
            })
            .await;
        Ok(())
    }
}
