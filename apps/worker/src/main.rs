//! `nebula-worker` (§2.8): a long-running process binding the in-memory
//! `JobQueue` to [`nebula_engine::Executor`]. Dequeues `workflowExecution`
//! jobs and drives them to completion; `notification`/`webhookDelivery`/
//! `emailSend` jobs are out of this subsystem's core scope (§1) and are
//! logged and acked rather than dropped silently.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::Config;
use nebula_core::Workflow;
use nebula_engine::Executor;
use nebula_eventbus::EventBus;
use nebula_node::{Dependencies, NodeRegistry};
use nebula_ports::{JobPayload, JobQueue};
use nebula_queue_memory::{
    MemoryCredentialProvider, MemoryExecutionService, MemoryQueue, MemoryRendezvous,
    MemoryWorkflowService,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nebula-worker", about = "Nebula workflow execution worker")]
struct Args {
    /// Path to a TOML config file; overrides built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory of workflow definition JSON files to preload into the
    /// in-memory workflow store at startup.
    #[arg(long)]
    workflows_dir: Option<PathBuf>,
}

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn load_workflows(dir: &PathBuf, workflows: &MemoryWorkflowService) -> anyhow::Result<usize> {
    let mut loaded = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let raw = std::fs::read_to_string(&path)?;
        let workflow: Workflow = serde_json::from_str(&raw)?;
        tracing::info!(workflow_id = %workflow.id, path = %path.display(), "loaded workflow definition");
        workflows.put(workflow);
        loaded += 1;
    }
    Ok(loaded)
}

fn build_registry(deps: Dependencies) -> Arc<NodeRegistry> {
    let mut registry = NodeRegistry::new();
    nebula_nodes::register_all(&mut registry);
    nebula_subworkflow::register_all(&mut registry);
    registry.set_dependencies(deps);
    registry.freeze();
    Arc::new(registry)
}

/// One worker loop: dequeue, dispatch, ack/nack, repeat until `shutdown`
/// fires.
async fn worker_loop(
    id: usize,
    job_queue: Arc<dyn JobQueue>,
    executor: Arc<Executor>,
    dequeue_timeout: Duration,
    shutdown: CancellationToken,
) {
    tracing::info!(worker = id, "worker loop started");
    loop {
        if shutdown.is_cancelled() {
            break;
        }
        let dequeued = tokio::select! {
            result = job_queue.dequeue(dequeue_timeout) => result,
            () = shutdown.cancelled() => break,
        };
        let (job_id, payload) = match dequeued {
            Ok(Some(pair)) => pair,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(worker = id, error = %err, "dequeue failed");
                continue;
            }
        };

        match payload {
            JobPayload::WorkflowExecution { execution_id, .. } => {
                tracing::info!(worker = id, %execution_id, "driving execution");
                match executor.run(execution_id, shutdown.child_token()).await {
                    Ok(status) => {
                        tracing::info!(worker = id, %execution_id, ?status, "execution finished");
                        if let Err(err) = job_queue.ack(&job_id).await {
                            tracing::warn!(worker = id, %job_id, error = %err, "ack failed");
                        }
                    }
                    Err(err) => {
                        tracing::error!(worker = id, %execution_id, error = %err, "execution failed to run");
                        if let Err(err) = job_queue.nack(&job_id).await {
                            tracing::warn!(worker = id, %job_id, error = %err, "nack failed");
                        }
                    }
                }
            }
            JobPayload::Notification { .. }
            | JobPayload::WebhookDelivery { .. }
            | JobPayload::EmailSend { .. } => {
                tracing::debug!(
                    worker = id,
                    %job_id,
                    "job kind out of core execution scope, acking without delivery"
                );
                if let Err(err) = job_queue.ack(&job_id).await {
                    tracing::warn!(worker = id, %job_id, error = %err, "ack failed");
                }
            }
        }
    }
    tracing::info!(worker = id, "worker loop stopped");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_ref())?;
    init_tracing(&config.log_filter);

    tracing::info!(?config, "starting nebula-worker");

    let job_queue: Arc<dyn JobQueue> = Arc::new(MemoryQueue::new(config.queue_capacity));
    let rendezvous = Arc::new(MemoryRendezvous::new());
    let executions = Arc::new(MemoryExecutionService::new());
    let workflows = Arc::new(MemoryWorkflowService::new());
    let credentials = Arc::new(MemoryCredentialProvider::new());
    let events = Arc::new(EventBus::new(config.event_bus_capacity));

    if let Some(dir) = &args.workflows_dir {
        let loaded = load_workflows(dir, &workflows)?;
        tracing::info!(count = loaded, "preloaded workflow definitions");
    }

    let deps = Dependencies {
        job_queue: job_queue.clone(),
        rendezvous: rendezvous.clone(),
        events: events.clone(),
        executions: executions.clone(),
    };
    let registry = build_registry(deps);

    let executor = Arc::new(
        Executor::new(
            registry,
            workflows.clone(),
            executions.clone(),
            events.clone(),
            config.default_node_timeout(),
        )
        .with_credentials(credentials.clone()),
    );

    let shutdown = CancellationToken::new();

    let mut handles = Vec::with_capacity(config.concurrency);
    for id in 0..config.concurrency {
        handles.push(tokio::spawn(worker_loop(
            id,
            job_queue.clone(),
            executor.clone(),
            config.dequeue_timeout(),
            shutdown.clone(),
        )));
    }

    let sweep_interval = config.rendezvous_sweep_interval();
    let sweep_rendezvous = rendezvous.clone();
    let sweep_shutdown = shutdown.clone();
    let sweep_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => sweep_rendezvous.sweep_expired(),
                () = sweep_shutdown.cancelled() => break,
            }
        }
    });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                tracing::warn!(error = %err, "failed to listen for ctrl-c");
            }
            tracing::info!("shutdown signal received");
        }
        () = shutdown.cancelled() => {}
    }
    shutdown.cancel();

    for handle in handles {
        let _ = handle.await;
    }
    let _ = sweep_handle.await;

    tracing::info!("nebula-worker stopped");
    Ok(())
}
